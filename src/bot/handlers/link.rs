//! The `/link@{id}` flow: propose a new lesson link, routed through the
//! group's moderator.

use teloxide::prelude::*;
use teloxide::types::ChatId;

use crate::bot::handlers::BotContext;
use crate::bot::keyboards::{build_keyboard_menu, cancel_footer};
use crate::bot::moderation::submit_request;
use crate::bot::session::Transition;
use crate::bot::states::StateId;
use crate::database::models::{Lesson, RequestDraft, RequestMeta, Teacher, User};
use crate::error::BotError;
use crate::utils::html::escape_html;

/// Starts the flow. The lesson must be visible to the user (their group,
/// and their subgroup when split) and the group must have a moderator to
/// approve the change.
pub async fn link_entry(
    ctx: &BotContext,
    msg: &Message,
    user: &User,
    lesson_id: i64,
) -> Result<Transition, BotError> {
    let Some(group_id) = user.students_group_id else {
        ctx.bot
            .send_message(msg.chat.id, "Pick your group first: /change_group")
            .await?;
        return Ok(Transition::End);
    };
    let visible =
        Lesson::find_visible_to_user(&ctx.db.pool, lesson_id, user.tg_id, group_id).await?;
    let Some(lesson) = visible else {
        ctx.bot
            .send_message(msg.chat.id, "That lesson is not in your timetable.")
            .await?;
        return Ok(Transition::End);
    };
    if User::moderator_for_group(&ctx.db.pool, group_id).await?.is_none() {
        ctx.bot
            .send_message(
                msg.chat.id,
                "Your group has no moderator yet, so link changes can't be approved.",
            )
            .await?;
        return Ok(Transition::End);
    }

    ctx.sessions.begin(user.tg_id, StateId::LinkWait);
    ctx.sessions
        .update(user.tg_id, |d| d.link_lesson_id = Some(lesson.id));
    ctx.bot
        .send_message(msg.chat.id, "Send the new link:")
        .reply_markup(build_keyboard_menu(Vec::new(), 1, Some(cancel_footer())))
        .await?;
    Ok(Transition::Next(StateId::LinkWait))
}

/// Consumes the typed link and submits the moderation request. The
/// conversation ends whatever happens; failed delivery to the moderator is
/// logged but the persisted request stands.
pub async fn request_link(ctx: &BotContext, user: &User, text: &str) -> Result<Transition, BotError> {
    let Some(lesson_id) = ctx.sessions.data(user.tg_id).and_then(|d| d.link_lesson_id) else {
        return Ok(Transition::End);
    };
    // Re-fetch: the lesson may have been dropped while the user typed.
    let Some(lesson) = Lesson::find_by_id(&ctx.db.pool, lesson_id).await? else {
        ctx.bot
            .send_message(ChatId(user.tg_id), "That lesson no longer exists.")
            .await?;
        return Ok(Transition::End);
    };

    let teachers = Teacher::for_lesson(&ctx.db.pool, lesson.id).await?;
    let mut message = format!(
        "@{} wants to set a new link for <b>{}</b>:\n{}",
        escape_html(&user.tg_username),
        escape_html(&lesson.title(&teachers)),
        escape_html(text),
    );
    if let Some(old) = &lesson.link {
        message.push_str(&format!("\ninstead of\n{}", escape_html(old)));
    }

    let draft = RequestDraft {
        students_group_id: lesson.students_group_id,
        initiator_id: user.tg_id,
        message,
        meta: RequestMeta {
            lesson_id: lesson.id,
            link: text.to_string(),
        },
    };
    match submit_request(ctx, &draft).await {
        Ok(_) => {}
        Err(BotError::NoModerator) => {
            // The moderator left between the entry check and submission.
            ctx.bot
                .send_message(
                    ChatId(user.tg_id),
                    "Your group has no moderator yet, so link changes can't be approved.",
                )
                .await?;
        }
        Err(BotError::Delivery(err)) => {
            tracing::warn!("Request persisted but delivery failed: {}", err);
        }
        Err(err) => return Err(err),
    }
    Ok(Transition::End)
}
