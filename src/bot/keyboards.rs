use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::bot::states::CANCEL;

/// Wraps `buttons` into rows of at most `n_cols`, with an optional footer
/// row appended as-is.
pub fn build_keyboard_menu(
    buttons: Vec<InlineKeyboardButton>,
    n_cols: usize,
    footer_buttons: Option<Vec<InlineKeyboardButton>>,
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = buttons
        .chunks(n_cols.max(1))
        .map(|chunk| chunk.to_vec())
        .collect();
    if let Some(footer) = footer_buttons {
        rows.push(footer);
    }
    InlineKeyboardMarkup::new(rows)
}

/// The footer row that aborts the active conversation.
pub fn cancel_footer() -> Vec<InlineKeyboardButton> {
    vec![InlineKeyboardButton::callback("❌ Cancel", CANCEL)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(n: usize) -> InlineKeyboardButton {
        InlineKeyboardButton::callback(format!("b{n}"), format!("cb{n}"))
    }

    #[test]
    fn test_wraps_into_columns() {
        let markup = build_keyboard_menu((0..5).map(button).collect(), 2, None);
        let rows = &markup.inline_keyboard;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[2].len(), 1);
    }

    #[test]
    fn test_footer_is_its_own_row() {
        let markup = build_keyboard_menu((0..2).map(button).collect(), 4, Some(cancel_footer()));
        let rows = &markup.inline_keyboard;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].len(), 1);
    }
}
