//! /help, /start and the cancel footer.

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::bot::commands::Command;
use crate::bot::handlers::{group_selection, BotContext};
use crate::bot::session::Transition;
use crate::database::models::User;
use crate::error::BotError;

const HELLO_MESSAGE: &str =
    "Hi! I keep your university timetable: daily and weekly views, lesson \
     links and reminders. First, tell me where you study.";

/// Sends the command list.
pub async fn help(ctx: &BotContext, msg: &Message) -> Result<Transition, BotError> {
    ctx.bot
        .send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(Transition::End)
}

/// First contact. A user without a group is taken straight into group
/// selection; a returning user gets a short greeting.
pub async fn start(ctx: &BotContext, msg: &Message, user: &User) -> Result<Transition, BotError> {
    if user.students_group_id.is_some() {
        ctx.bot
            .send_message(
                msg.chat.id,
                "Welcome back! /day and /week show your timetable, /change_group moves you.",
            )
            .await?;
        return Ok(Transition::End);
    }
    ctx.bot.send_message(msg.chat.id, HELLO_MESSAGE).await?;
    group_selection::change_group(ctx, msg, user).await
}

/// The ❌ Cancel footer: drops the prompt message and the session.
pub async fn end_conversation(ctx: &BotContext, q: &CallbackQuery) -> Result<Transition, BotError> {
    ctx.bot.answer_callback_query(q.id.clone()).await?;
    if let Some(message) = q.message.as_ref() {
        ctx.bot.delete_message(message.chat.id, message.id).await?;
    }
    Ok(Transition::End)
}
