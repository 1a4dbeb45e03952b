//! Moderation request protocol: route a privileged change through the
//! group's single moderator, exactly once.
//!
//! Storage mutation is kept separate from message delivery so the protocol
//! invariants (two-phase token persistence, at-most-once resolution) are
//! testable without a transport. Delivery failures surface to the caller
//! but never roll back committed rows.

use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, ParseMode};

use crate::bot::handlers::BotContext;
use crate::bot::keyboards::build_keyboard_menu;
use crate::bot::states::StateRegistry;
use crate::database::models::{Lesson, Request, RequestDraft, User};
use crate::error::BotError;

/// What actually happened when a request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Accepted. `link_applied` is false when the target lesson vanished
    /// between submission and resolution; the request is still closed.
    Accepted {
        /// Whether the meta payload was applied to its target.
        link_applied: bool,
    },
    /// Rejected without touching the target.
    Rejected,
}

/// Accept or reject, as decoded from the clicked button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Apply the request's payload.
    Accept,
    /// Discard the request.
    Reject,
}

/// Persists a draft as a complete request, or nothing at all.
///
/// Two-phase: the row is inserted with empty tokens to obtain an id, then
/// the accept/reject tokens embedding that id are stored. A group without a
/// moderator fails with [`BotError::NoModerator`] before anything is
/// written.
pub async fn create_request(
    pool: &sqlx::SqlitePool,
    states: &StateRegistry,
    draft: &RequestDraft,
) -> Result<Request, BotError> {
    let moderator = User::moderator_for_group(pool, draft.students_group_id)
        .await?
        .ok_or(BotError::NoModerator)?;

    let id = Request::insert(pool, draft, moderator.tg_id).await?;
    let accept = states.moderator_accept_link.build(&[&id.to_string()])?;
    let reject = states.moderator_reject_link.build(&[&id.to_string()])?;
    Request::set_callbacks(pool, id, &accept, &reject).await?;

    Request::find_by_id(pool, id)
        .await?
        .ok_or(BotError::NotFound("request"))
}

/// Persists the draft and delivers both messages: the moderator's prompt
/// with Accept/Reject buttons and the initiator's confirmation.
pub async fn submit_request(ctx: &BotContext, draft: &RequestDraft) -> Result<Request, BotError> {
    let request = create_request(&ctx.db.pool, &ctx.states, draft).await?;

    let buttons = vec![
        InlineKeyboardButton::callback("✅ Accept", request.accept_callback.clone()),
        InlineKeyboardButton::callback("❌ Reject", request.reject_callback.clone()),
    ];
    let keyboard = build_keyboard_menu(buttons, 2, None);

    ctx.bot
        .send_message(ChatId(request.moderator_id), request.message.clone())
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    ctx.bot
        .send_message(
            ChatId(request.initiator_id),
            format!("Request #{} was sent to your group's moderator.", request.id),
        )
        .await?;

    tracing::info!(
        "Request {} submitted by {} to moderator {}",
        request.id,
        request.initiator_id,
        request.moderator_id
    );
    Ok(request)
}

/// Resolves a request at most once.
///
/// Fails with [`BotError::NotFound`] for an unknown id and
/// [`BotError::AlreadyResolved`] for a second click of either button; the
/// first outcome always wins. An accepted request whose target lesson has
/// vanished is still marked resolved, with `link_applied: false`.
pub async fn apply_resolution(
    pool: &sqlx::SqlitePool,
    request_id: i64,
    outcome: ResolveOutcome,
) -> Result<(Request, Resolution), BotError> {
    let request = Request::find_by_id(pool, request_id)
        .await?
        .ok_or(BotError::NotFound("request"))?;
    if request.is_resolved {
        return Err(BotError::AlreadyResolved);
    }

    match outcome {
        ResolveOutcome::Reject => {
            Request::mark_resolved(pool, request.id).await?;
            Ok((request, Resolution::Rejected))
        }
        ResolveOutcome::Accept => {
            let meta = request.parse_meta()?;
            let link_applied = match Lesson::find_by_id(pool, meta.lesson_id).await? {
                Some(_) => {
                    Lesson::set_link(pool, meta.lesson_id, &meta.link).await?;
                    true
                }
                None => false,
            };
            Request::mark_resolved(pool, request.id).await?;
            Ok((request, Resolution::Accepted { link_applied }))
        }
    }
}
