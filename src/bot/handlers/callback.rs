//! Callback-side dispatch.
//!
//! Moderation buttons are matched first and work regardless of any active
//! conversation; the cancel footer is next; everything else is routed by
//! the user's current state, whose pattern must accept the token. A token
//! that matches nothing is answered and dropped, so stale buttons from old
//! keyboards stay harmless.

use teloxide::prelude::*;

use crate::bot::handlers::{basic, finish, group_selection, moderation, timetable, BotContext};
use crate::bot::moderation::ResolveOutcome;
use crate::bot::states::{StateId, CANCEL};
use crate::database::models::User;
use crate::error::BotError;

pub async fn callback_handler(ctx: &BotContext, q: CallbackQuery) -> Result<(), BotError> {
    let user_id = q.from.id.0 as i64;
    let username = q.from.username.clone().unwrap_or_default();
    let user = User::acquire(&ctx.db.pool, user_id, &username).await?;

    let Some(token) = q.data.clone() else {
        ctx.bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let moderation_states = [
        (&ctx.states.moderator_accept_link, ResolveOutcome::Accept),
        (&ctx.states.moderator_reject_link, ResolveOutcome::Reject),
    ];
    for (state, outcome) in moderation_states {
        let Some(args) = state.parse(&token) else {
            continue;
        };
        if !user.is_group_moderator {
            // Button forwarded or the role was revoked after delivery.
            ctx.bot.answer_callback_query(q.id.clone()).await?;
            finish(ctx, user_id, Err(BotError::PermissionDenied));
            return Ok(());
        }
        let Some(request_id) = args.first().and_then(|a| a.parse::<i64>().ok()) else {
            ctx.bot.answer_callback_query(q.id.clone()).await?;
            return Ok(());
        };
        let result = moderation::resolve_click(ctx, &q, request_id, outcome).await;
        finish(ctx, user_id, result);
        return Ok(());
    }

    if token == CANCEL {
        let result = basic::end_conversation(ctx, &q).await;
        finish(ctx, user_id, result);
        return Ok(());
    }

    let Some(state_id) = ctx.sessions.current_state(user_id) else {
        ctx.bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let state = ctx.states.get(state_id);
    let args = if state.text_input {
        None
    } else {
        state.parse(&token)
    };
    let Some(args) = args else {
        ctx.bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let Some(arg) = args.first() else {
        ctx.bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let result = match state_id {
        StateId::SelectCourse => group_selection::select_course(ctx, &q, arg).await,
        StateId::SelectFaculty => group_selection::select_faculty(ctx, &q, arg).await,
        StateId::SelectGroup => group_selection::select_group(ctx, &q, &user, arg).await,
        StateId::SelectSubgroups => group_selection::select_subgroup(ctx, &q, &user, arg).await,
        StateId::TimetableDaySelection => {
            timetable::show_day(ctx, timetable::TimetableOrigin::Callback(&q), &user, Some(arg))
                .await
        }
        StateId::TimetableWeekSelection => {
            timetable::show_week(ctx, timetable::TimetableOrigin::Callback(&q), &user, Some(arg))
                .await
        }
        // Text-input and moderation states never reach this match.
        StateId::LinkWait | StateId::ModeratorAcceptLink | StateId::ModeratorRejectLink => {
            Ok(crate::bot::session::Transition::Stay)
        }
    };
    finish(ctx, user_id, result);
    Ok(())
}
