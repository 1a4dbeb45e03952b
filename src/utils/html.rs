/// Escaping for Telegram's HTML parse mode.
///
/// Only `&`, `<` and `>` are special in Telegram HTML; everything else is
/// sent literally.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
