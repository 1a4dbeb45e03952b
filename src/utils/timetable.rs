//! Pure rendering of timetable text in Telegram HTML.
//!
//! The async query side lives in the models
//! ([`crate::database::models::timetable_entries`]); these functions take
//! assembled entries so they stay testable without a database.

use chrono::{Datelike, Duration, NaiveDate};

use crate::database::models::TimetableEntry;
use crate::utils::datetime::day_name;
use crate::utils::html::escape_html;

/// One lesson block: times, bold subject with format label, teachers and a
/// link line carrying the `/link@{id}` change hint.
pub fn render_lesson(entry: &TimetableEntry) -> String {
    let teachers = entry
        .teachers
        .iter()
        .map(|t| format!("👤 {}", escape_html(&t.short_name())))
        .collect::<Vec<_>>()
        .join(" ");
    let mut block = format!(
        "{} - {}\n📚 <b>{}</b> ({})\n{}\n",
        entry.occurrence.starts_at.format("%H:%M"),
        entry.occurrence.ends_at.format("%H:%M"),
        escape_html(&entry.lesson.name),
        entry.lesson.format_label(),
        teachers,
    );
    match &entry.lesson.link {
        Some(link) => {
            block.push_str(&format!(
                "<a href=\"{}\"><u><i>Lesson link</i></u></a>. Change: /link@{}\n",
                escape_html(link),
                entry.lesson.id
            ));
        }
        None => {
            block.push_str(&format!("Set a link: /link@{}\n", entry.lesson.id));
        }
    }
    block.trim_end().to_string()
}

/// All of a day's lessons, blank-line separated. Empty when there are none.
pub fn render_day(entries: &[TimetableEntry]) -> String {
    entries
        .iter()
        .map(render_lesson)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// A week of days starting at `monday`, skipping days without lessons.
/// `days` holds seven entry slices, Monday first.
pub fn render_week(monday: NaiveDate, days: &[Vec<TimetableEntry>; 7]) -> String {
    let mut out = String::new();
    for (idx, entries) in days.iter().enumerate() {
        if entries.is_empty() {
            continue;
        }
        let date = monday + Duration::days(idx as i64);
        out.push_str(&format!(
            "[ <b>{}</b> ]\n{}\n\n",
            day_name(date.weekday()),
            render_day(entries)
        ));
    }
    out.trim_end().to_string()
}

/// Header line for the day view: "<b>Wednesday</b> (02.09)".
pub fn day_header(date: NaiveDate) -> String {
    format!(
        "<b>{}</b> ({})",
        day_name(date.weekday()),
        date.format("%d.%m")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Lesson, SingleLesson, Teacher};
    use chrono::NaiveTime;

    fn entry(name: &str, link: Option<&str>, subgroup: Option<&str>) -> TimetableEntry {
        TimetableEntry {
            occurrence: SingleLesson {
                id: 1,
                date: NaiveDate::from_ymd_opt(2026, 9, 2).unwrap(),
                starts_at: NaiveTime::from_hms_opt(8, 40, 0).unwrap(),
                ends_at: NaiveTime::from_hms_opt(10, 15, 0).unwrap(),
                lesson_id: 7,
                comment: None,
            },
            lesson: Lesson {
                id: 7,
                name: name.to_string(),
                students_group_id: 1,
                subgroup: subgroup.map(String::from),
                lesson_format: 0,
                link: link.map(String::from),
            },
            teachers: vec![Teacher {
                id: 1,
                first_name: "Anna".to_string(),
                last_name: "Koval".to_string(),
                middle_name: "Petrivna".to_string(),
            }],
        }
    }

    #[test]
    fn test_render_lesson_without_link() {
        let text = render_lesson(&entry("Linear Algebra", None, None));
        assert!(text.starts_with("08:40 - 10:15"));
        assert!(text.contains("<b>Linear Algebra</b> (lecture)"));
        assert!(text.contains("👤 Koval A. P."));
        assert!(text.contains("Set a link: /link@7"));
    }

    #[test]
    fn test_render_lesson_with_link() {
        let text = render_lesson(&entry("Calculus", Some("https://meet.example/x"), None));
        assert!(text.contains("<a href=\"https://meet.example/x\">"));
        assert!(text.contains("Change: /link@7"));
        assert!(!text.contains("Set a link"));
    }

    #[test]
    fn test_render_lesson_escapes_html() {
        let text = render_lesson(&entry("Logic <& Proofs>", None, None));
        assert!(text.contains("<b>Logic &lt;&amp; Proofs&gt;</b>"));
    }

    #[test]
    fn test_render_day_joins_blocks() {
        let entries = vec![entry("A", None, None), entry("B", None, None)];
        let text = render_day(&entries);
        assert_eq!(text.matches("📚").count(), 2);
        assert!(text.contains("\n\n"));
    }

    #[test]
    fn test_render_week_skips_empty_days() {
        let monday = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        let mut days: [Vec<TimetableEntry>; 7] = Default::default();
        days[2] = vec![entry("Midweek", None, None)];
        let text = render_week(monday, &days);
        assert!(text.contains("[ <b>Wednesday</b> ]"));
        assert!(!text.contains("Monday"));
        assert!(!text.contains("Thursday"));
    }

    #[test]
    fn test_day_header() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 2).unwrap();
        assert_eq!(day_header(date), "<b>Wednesday</b> (02.09)");
    }
}
