//! Group selection: course, faculty, group, then one subgroup question per
//! ambiguous lesson.
//!
//! The subgroup step re-enters itself: after each answer the ambiguous set
//! is recomputed from storage minus the pairs already answered in this
//! conversation, so lessons imported mid-flow are still asked about. When
//! nothing ambiguous is left, the whole selection commits in one
//! transaction.

use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, ParseMode};

use crate::bot::handlers::{is_message_not_modified, BotContext};
use crate::bot::keyboards::{build_keyboard_menu, cancel_footer};
use crate::bot::session::Transition;
use crate::bot::states::StateId;
use crate::database::models::{Faculty, Lesson, StudentsGroup, Teacher, User};
use crate::error::BotError;

/// Entry point for /change_group and the /start onboarding.
pub async fn change_group(
    ctx: &BotContext,
    msg: &Message,
    user: &User,
) -> Result<Transition, BotError> {
    let courses = StudentsGroup::distinct_courses(&ctx.db.pool).await?;
    if courses.is_empty() {
        ctx.bot
            .send_message(msg.chat.id, "No groups are available yet. Try again later.")
            .await?;
        return Ok(Transition::End);
    }

    let mut text = String::from("Choose your course:");
    if user.is_group_moderator {
        text = format!(
            "You moderate your current group; picking a new one revokes that role.\n\n{text}"
        );
    }

    let mut buttons = Vec::with_capacity(courses.len());
    for course in &courses {
        let course = course.to_string();
        buttons.push(InlineKeyboardButton::callback(
            course.clone(),
            ctx.states.select_course.build(&[&course])?,
        ));
    }
    // Users without a group have nothing to fall back to, so no cancel.
    let footer = user.students_group_id.map(|_| cancel_footer());
    ctx.bot
        .send_message(msg.chat.id, text)
        .reply_markup(build_keyboard_menu(buttons, 4, footer))
        .await?;

    ctx.sessions.begin(user.tg_id, StateId::SelectCourse);
    Ok(Transition::Next(StateId::SelectCourse))
}

/// Course picked; offer the faculties teaching that course.
pub async fn select_course(
    ctx: &BotContext,
    q: &CallbackQuery,
    arg: &str,
) -> Result<Transition, BotError> {
    let user_id = q.from.id.0 as i64;
    let course: i64 = arg.parse().map_err(|_| BotError::Validation("course"))?;
    if !StudentsGroup::course_exists(&ctx.db.pool, course).await? {
        ctx.bot.answer_callback_query(q.id.clone()).await?;
        return Ok(Transition::Stay);
    }
    let Some(message) = q.message.as_ref() else {
        ctx.bot.answer_callback_query(q.id.clone()).await?;
        return Ok(Transition::Stay);
    };

    ctx.sessions.update(user_id, |d| d.course = Some(course));

    let faculties = Faculty::with_course(&ctx.db.pool, course).await?;
    let mut buttons = Vec::with_capacity(faculties.len());
    for faculty in &faculties {
        buttons.push(InlineKeyboardButton::callback(
            faculty.shortcut.clone(),
            ctx.states.select_faculty.build(&[&faculty.id.to_string()])?,
        ));
    }

    edit_prompt(
        ctx,
        message,
        "Choose your faculty:",
        Some(build_keyboard_menu(buttons, 3, Some(cancel_footer()))),
    )
    .await?;
    ctx.bot.answer_callback_query(q.id.clone()).await?;
    Ok(Transition::Next(StateId::SelectFaculty))
}

/// Faculty picked; offer its groups on the stashed course.
pub async fn select_faculty(
    ctx: &BotContext,
    q: &CallbackQuery,
    arg: &str,
) -> Result<Transition, BotError> {
    let user_id = q.from.id.0 as i64;
    let faculty_id: i64 = arg.parse().map_err(|_| BotError::Validation("faculty"))?;
    let Some(course) = ctx.sessions.data(user_id).and_then(|d| d.course) else {
        ctx.bot.answer_callback_query(q.id.clone()).await?;
        return Ok(Transition::Stay);
    };
    if Faculty::find_by_id(&ctx.db.pool, faculty_id).await?.is_none() {
        ctx.bot.answer_callback_query(q.id.clone()).await?;
        return Ok(Transition::Stay);
    }
    let Some(message) = q.message.as_ref() else {
        ctx.bot.answer_callback_query(q.id.clone()).await?;
        return Ok(Transition::Stay);
    };

    ctx.sessions.update(user_id, |d| d.faculty_id = Some(faculty_id));

    let groups = StudentsGroup::by_faculty_and_course(&ctx.db.pool, faculty_id, course).await?;
    let mut buttons = Vec::with_capacity(groups.len());
    for group in &groups {
        buttons.push(InlineKeyboardButton::callback(
            group.name.clone(),
            ctx.states.select_group.build(&[&group.id.to_string()])?,
        ));
    }

    edit_prompt(
        ctx,
        message,
        "Choose your group:",
        Some(build_keyboard_menu(buttons, 3, Some(cancel_footer()))),
    )
    .await?;
    ctx.bot.answer_callback_query(q.id.clone()).await?;
    Ok(Transition::Next(StateId::SelectGroup))
}

/// Group picked; move on to subgroup disambiguation (or finish immediately
/// when the group has no ambiguous lessons).
pub async fn select_group(
    ctx: &BotContext,
    q: &CallbackQuery,
    user: &User,
    arg: &str,
) -> Result<Transition, BotError> {
    let user_id = q.from.id.0 as i64;
    let group_id: i64 = arg.parse().map_err(|_| BotError::Validation("group"))?;
    let Some(group) = StudentsGroup::find_by_id(&ctx.db.pool, group_id).await? else {
        ctx.bot.answer_callback_query(q.id.clone()).await?;
        return Ok(Transition::Stay);
    };
    let Some(message) = q.message.as_ref() else {
        ctx.bot.answer_callback_query(q.id.clone()).await?;
        return Ok(Transition::Stay);
    };

    ctx.sessions.update(user_id, |d| d.group_id = Some(group_id));

    edit_prompt(ctx, message, &format!("Group {} selected.", group.name), None).await?;
    ctx.bot.answer_callback_query(q.id.clone()).await?;
    subgroup_step(ctx, message.chat.id, user).await
}

/// One subgroup answered; record the variant and re-enter the step.
pub async fn select_subgroup(
    ctx: &BotContext,
    q: &CallbackQuery,
    user: &User,
    arg: &str,
) -> Result<Transition, BotError> {
    let user_id = q.from.id.0 as i64;
    let data = ctx.sessions.data(user_id).unwrap_or_default();
    let (Some(group_id), Some((name, lesson_format))) = (data.group_id, data.current_subgroup_lesson)
    else {
        ctx.bot.answer_callback_query(q.id.clone()).await?;
        return Ok(Transition::Stay);
    };
    let Some(variant) =
        Lesson::find_variant(&ctx.db.pool, group_id, &name, lesson_format, arg).await?
    else {
        // Stale button for a variant that no longer exists; re-ask.
        ctx.bot.answer_callback_query(q.id.clone()).await?;
        return Ok(Transition::Stay);
    };
    let Some(message) = q.message.as_ref() else {
        ctx.bot.answer_callback_query(q.id.clone()).await?;
        return Ok(Transition::Stay);
    };

    ctx.sessions.update(user_id, |d| {
        d.subgroups.push(variant.clone());
        d.current_subgroup_lesson = None;
    });

    edit_prompt(
        ctx,
        message,
        &format!("{}: subgroup {}.", name, arg),
        None,
    )
    .await?;
    ctx.bot.answer_callback_query(q.id.clone()).await?;
    subgroup_step(ctx, message.chat.id, user).await
}

/// Asks about the next ambiguous lesson, or commits the whole selection.
async fn subgroup_step(
    ctx: &BotContext,
    chat_id: ChatId,
    user: &User,
) -> Result<Transition, BotError> {
    let data = ctx.sessions.data(user.tg_id).unwrap_or_default();
    let Some(group_id) = data.group_id else {
        return Ok(Transition::End);
    };

    let answered: Vec<(String, i64)> = data
        .subgroups
        .iter()
        .map(|l| (l.name.clone(), l.lesson_format))
        .collect();
    let pairs = Lesson::ambiguous_pairs(&ctx.db.pool, group_id).await?;
    let next = pairs.into_iter().find(|pair| !answered.contains(pair));

    let Some((name, lesson_format)) = next else {
        let lesson_ids: Vec<i64> = data.subgroups.iter().map(|l| l.id).collect();
        User::assign_group(&ctx.db.pool, user.tg_id, group_id, &lesson_ids).await?;
        ctx.bot
            .send_message(
                chat_id,
                "✅ Group saved. /day and /week now show your timetable.",
            )
            .await?;
        return Ok(Transition::End);
    };

    let variants = Lesson::subgroup_variants(&ctx.db.pool, group_id, &name, lesson_format).await?;
    let format_label = variants
        .first()
        .map(Lesson::format_label)
        .unwrap_or("other");
    let mut buttons = Vec::with_capacity(variants.len());
    for variant in &variants {
        let Some(tag) = variant.subgroup.as_deref() else {
            continue;
        };
        let teachers = Teacher::for_lesson(&ctx.db.pool, variant.id).await?;
        let names: Vec<String> = teachers.iter().map(Teacher::short_name).collect();
        let label = if names.is_empty() {
            format!("[{tag}]")
        } else {
            format!("[{}] {}", tag, names.join(", "))
        };
        buttons.push(InlineKeyboardButton::callback(
            label,
            ctx.states.select_subgroups.build(&[tag])?,
        ));
    }

    ctx.sessions.update(user.tg_id, |d| {
        d.current_subgroup_lesson = Some((name.clone(), lesson_format));
    });
    ctx.bot
        .send_message(
            chat_id,
            format!(
                "Which subgroup of <b>{}</b> ({})?",
                crate::utils::html::escape_html(&name),
                format_label
            ),
        )
        .parse_mode(ParseMode::Html)
        .reply_markup(build_keyboard_menu(buttons, 2, Some(cancel_footer())))
        .await?;
    Ok(Transition::Next(StateId::SelectSubgroups))
}

async fn edit_prompt(
    ctx: &BotContext,
    message: &Message,
    text: &str,
    markup: Option<teloxide::types::InlineKeyboardMarkup>,
) -> Result<(), BotError> {
    let edit = ctx.bot.edit_message_text(message.chat.id, message.id, text);
    let result = match markup {
        Some(markup) => edit.reply_markup(markup).await,
        None => edit.await,
    };
    match result {
        Ok(_) => Ok(()),
        Err(err) if is_message_not_modified(&err) => Ok(()),
        Err(err) => Err(err.into()),
    }
}
