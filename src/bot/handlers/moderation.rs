//! Moderator-side click handling for request buttons.
//!
//! The storage outcome decides the surface: both parties learn the result,
//! the second click of a resolved request only strips the stale buttons,
//! and a request that cannot be interpreted is removed.

use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};

use crate::bot::handlers::{is_message_not_modified, BotContext};
use crate::bot::moderation::{apply_resolution, Resolution, ResolveOutcome};
use crate::bot::session::Transition;
use crate::error::BotError;

pub async fn resolve_click(
    ctx: &BotContext,
    q: &CallbackQuery,
    request_id: i64,
    outcome: ResolveOutcome,
) -> Result<Transition, BotError> {
    match apply_resolution(&ctx.db.pool, request_id, outcome).await {
        Ok((request, resolution)) => {
            ctx.bot.answer_callback_query(q.id.clone()).await?;

            let (prefix, initiator_note) = match resolution {
                Resolution::Accepted { link_applied: true } => {
                    ("✅", format!("✅ Your request #{} was accepted!", request.id))
                }
                Resolution::Accepted { link_applied: false } => (
                    "⚠️",
                    format!(
                        "⚠️ Your request #{} was closed: the lesson no longer exists.",
                        request.id
                    ),
                ),
                Resolution::Rejected => {
                    ("❌", format!("❌ Your request #{} was rejected.", request.id))
                }
            };

            if let Some(message) = q.message.as_ref() {
                // Re-rendering without a keyboard removes the buttons.
                let result = ctx
                    .bot
                    .edit_message_text(
                        message.chat.id,
                        message.id,
                        format!("{} {}", prefix, request.message),
                    )
                    .parse_mode(ParseMode::Html)
                    .await;
                match result {
                    Ok(_) => {}
                    Err(err) if is_message_not_modified(&err) => {}
                    Err(err) => return Err(err.into()),
                }
            }
            ctx.bot
                .send_message(ChatId(request.initiator_id), initiator_note)
                .await?;
            Ok(Transition::Stay)
        }
        Err(BotError::AlreadyResolved) => {
            // Second click of either button: the first outcome stands.
            ctx.bot.answer_callback_query(q.id.clone()).await?;
            if let Some(message) = q.message.as_ref() {
                ctx.bot
                    .edit_message_reply_markup(message.chat.id, message.id)
                    .await?;
            }
            Ok(Transition::Stay)
        }
        Err(BotError::NotFound(_)) | Err(BotError::Meta(_)) => {
            ctx.bot.answer_callback_query(q.id.clone()).await?;
            if let Some(message) = q.message.as_ref() {
                ctx.bot.delete_message(message.chat.id, message.id).await?;
            }
            Ok(Transition::Stay)
        }
        Err(err) => Err(err),
    }
}
