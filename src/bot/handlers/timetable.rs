//! /day and /week views with prev/today/next navigation.
//!
//! A command sends a fresh message; a navigation click edits the one it
//! came from. The navigation tokens carry absolute dates, so a button
//! stays meaningful however long it sits in the chat.

use chrono::{Duration, Local, NaiveDate};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use crate::bot::handlers::{is_message_not_modified, BotContext};
use crate::bot::keyboards::build_keyboard_menu;
use crate::bot::session::Transition;
use crate::bot::states::{ConversationState, StateId};
use crate::database::models::{timetable_entries, TimetableEntry, User};
use crate::error::BotError;
use crate::utils::datetime::{format_button_date, monday_of};
use crate::utils::timetable::{day_header, render_day, render_week};

/// Where a timetable view was requested from.
pub enum TimetableOrigin<'a> {
    /// A /day or /week command; reply with a new message.
    Command(&'a Message),
    /// A navigation click; edit the clicked message.
    Callback(&'a CallbackQuery),
}

/// One day of lessons. `date_arg` is the navigation token's date; absent
/// for the command entry, which shows today.
pub async fn show_day(
    ctx: &BotContext,
    origin: TimetableOrigin<'_>,
    user: &User,
    date_arg: Option<&str>,
) -> Result<Transition, BotError> {
    let Some(group_id) = user.students_group_id else {
        return no_group(ctx, &origin).await;
    };
    let date = parse_date(date_arg);

    let entries = timetable_entries(&ctx.db.pool, user.tg_id, group_id, date).await?;
    let body = if entries.is_empty() {
        "No lessons on this day. 🎉".to_string()
    } else {
        render_day(&entries)
    };
    let text = format!("{}\n\n{}", day_header(date), body);

    let keyboard = nav_keyboard(
        &ctx.states.timetable_day_selection,
        date - Duration::days(1),
        Local::now().date_naive(),
        date + Duration::days(1),
    )?;
    deliver(ctx, &origin, &text, keyboard).await?;
    Ok(Transition::Next(StateId::TimetableDaySelection))
}

/// One week of lessons, Monday-aligned whatever date the token carries.
pub async fn show_week(
    ctx: &BotContext,
    origin: TimetableOrigin<'_>,
    user: &User,
    date_arg: Option<&str>,
) -> Result<Transition, BotError> {
    let Some(group_id) = user.students_group_id else {
        return no_group(ctx, &origin).await;
    };
    let monday = monday_of(parse_date(date_arg));

    let mut days: [Vec<TimetableEntry>; 7] = Default::default();
    for (idx, slot) in days.iter_mut().enumerate() {
        let date = monday + Duration::days(idx as i64);
        *slot = timetable_entries(&ctx.db.pool, user.tg_id, group_id, date).await?;
    }
    let body = render_week(monday, &days);
    let body = if body.is_empty() {
        "No lessons this week. 🎉".to_string()
    } else {
        body
    };
    let sunday = monday + Duration::days(6);
    let text = format!(
        "Week {} — {}\n\n{}",
        monday.format("%d.%m"),
        sunday.format("%d.%m"),
        body
    );

    let keyboard = nav_keyboard(
        &ctx.states.timetable_week_selection,
        monday - Duration::days(7),
        monday_of(Local::now().date_naive()),
        monday + Duration::days(7),
    )?;
    deliver(ctx, &origin, &text, keyboard).await?;
    Ok(Transition::Next(StateId::TimetableWeekSelection))
}

fn parse_date(date_arg: Option<&str>) -> NaiveDate {
    date_arg
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .unwrap_or_else(|| Local::now().date_naive())
}

fn nav_keyboard(
    state: &ConversationState,
    prev: NaiveDate,
    today: NaiveDate,
    next: NaiveDate,
) -> Result<InlineKeyboardMarkup, BotError> {
    let buttons = vec![
        InlineKeyboardButton::callback(
            format!("< {}", format_button_date(prev)),
            state.build(&[&prev.format("%Y-%m-%d").to_string()])?,
        ),
        InlineKeyboardButton::callback(
            "Today",
            state.build(&[&today.format("%Y-%m-%d").to_string()])?,
        ),
        InlineKeyboardButton::callback(
            format!("{} >", format_button_date(next)),
            state.build(&[&next.format("%Y-%m-%d").to_string()])?,
        ),
    ];
    Ok(build_keyboard_menu(buttons, 3, None))
}

async fn deliver(
    ctx: &BotContext,
    origin: &TimetableOrigin<'_>,
    text: &str,
    keyboard: InlineKeyboardMarkup,
) -> Result<(), BotError> {
    match origin {
        TimetableOrigin::Command(msg) => {
            ctx.bot
                .send_message(msg.chat.id, text)
                .parse_mode(ParseMode::Html)
                .disable_web_page_preview(true)
                .reply_markup(keyboard)
                .await?;
        }
        TimetableOrigin::Callback(q) => {
            if let Some(message) = q.message.as_ref() {
                let result = ctx
                    .bot
                    .edit_message_text(message.chat.id, message.id, text)
                    .parse_mode(ParseMode::Html)
                    .disable_web_page_preview(true)
                    .reply_markup(keyboard)
                    .await;
                match result {
                    Ok(_) => {}
                    // Clicking "Today" while already on today edits nothing.
                    Err(err) if is_message_not_modified(&err) => {}
                    Err(err) => return Err(err.into()),
                }
            }
            ctx.bot.answer_callback_query(q.id.clone()).await?;
        }
    }
    Ok(())
}

async fn no_group(
    ctx: &BotContext,
    origin: &TimetableOrigin<'_>,
) -> Result<Transition, BotError> {
    let chat_id = match origin {
        TimetableOrigin::Command(msg) => Some(msg.chat.id),
        TimetableOrigin::Callback(q) => {
            ctx.bot.answer_callback_query(q.id.clone()).await?;
            q.message.as_ref().map(|m| m.chat.id)
        }
    };
    if let Some(chat_id) = chat_id {
        ctx.bot
            .send_message(chat_id, "Pick your group first: /change_group")
            .await?;
    }
    Ok(Transition::End)
}
