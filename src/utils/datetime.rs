use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// The Monday of the week containing `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// English weekday name for timetable headers.
pub fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// `dd.mm.YYYY`, used on navigation buttons.
pub fn format_button_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monday_of_midweek() {
        let wed = NaiveDate::from_ymd_opt(2026, 9, 2).unwrap();
        assert_eq!(monday_of(wed), NaiveDate::from_ymd_opt(2026, 8, 31).unwrap());
    }

    #[test]
    fn test_monday_of_monday_is_identity() {
        let mon = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        assert_eq!(monday_of(mon), mon);
    }

    #[test]
    fn test_monday_of_sunday() {
        let sun = NaiveDate::from_ymd_opt(2026, 9, 6).unwrap();
        assert_eq!(monday_of(sun), NaiveDate::from_ymd_opt(2026, 8, 31).unwrap());
    }

    #[test]
    fn test_format_button_date() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(format_button_date(date), "05.01.2026");
    }
}
