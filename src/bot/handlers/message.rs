//! Message-side dispatch: slash commands and plain text.

use teloxide::prelude::*;

use crate::bot::commands::Command;
use crate::bot::handlers::{basic, finish, group_selection, link, timetable, BotContext};
use crate::bot::states::StateId;
use crate::database::models::User;
use crate::error::BotError;

/// Routes a recognized slash command. Entry commands restart any active
/// conversation implicitly.
pub async fn command_handler(ctx: &BotContext, msg: Message, cmd: Command) -> Result<(), BotError> {
    let Some(from) = msg.from() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;
    let username = from.username.clone().unwrap_or_default();
    let user = User::acquire(&ctx.db.pool, user_id, &username).await?;

    let result = match cmd {
        Command::Help => basic::help(ctx, &msg).await,
        Command::Start => basic::start(ctx, &msg, &user).await,
        Command::ChangeGroup => group_selection::change_group(ctx, &msg, &user).await,
        Command::Day => {
            timetable::show_day(ctx, timetable::TimetableOrigin::Command(&msg), &user, None).await
        }
        Command::Week => {
            timetable::show_week(ctx, timetable::TimetableOrigin::Command(&msg), &user, None).await
        }
    };
    finish(ctx, user_id, result);
    Ok(())
}

/// Routes plain text: the `/link@{id}` entry (its `@` keeps it out of the
/// command parser), then text consumed by a waiting conversation. Anything
/// else is ignored.
pub async fn text_handler(ctx: &BotContext, msg: Message) -> Result<(), BotError> {
    let Some(from) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;
    let username = from.username.clone().unwrap_or_default();
    let user = User::acquire(&ctx.db.pool, user_id, &username).await?;

    if let Some(caps) = ctx.states.link_command.captures(text) {
        let Some(lesson_id) = caps.get(1).and_then(|m| m.as_str().parse::<i64>().ok()) else {
            return Ok(());
        };
        let result = link::link_entry(ctx, &msg, &user, lesson_id).await;
        finish(ctx, user_id, result);
        return Ok(());
    }

    if ctx.sessions.current_state(user_id) == Some(StateId::LinkWait) {
        let result = link::request_link(ctx, &user, text).await;
        finish(ctx, user_id, result);
    }
    Ok(())
}
