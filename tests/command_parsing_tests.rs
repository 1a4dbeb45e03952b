use teloxide::utils::command::BotCommands;
use uni_timetable_bot::bot::commands::Command;

#[test]
fn test_help_command_parsing() {
    let result = Command::parse("/help", "testbot");
    assert!(matches!(result, Ok(Command::Help)));
}

#[test]
fn test_start_command_parsing() {
    let result = Command::parse("/start", "testbot");
    assert!(matches!(result, Ok(Command::Start)));
}

#[test]
fn test_change_group_uses_snake_case() {
    let result = Command::parse("/change_group", "testbot");
    assert!(matches!(result, Ok(Command::ChangeGroup)));
}

#[test]
fn test_day_and_week_parsing() {
    assert!(matches!(Command::parse("/day", "testbot"), Ok(Command::Day)));
    assert!(matches!(Command::parse("/week", "testbot"), Ok(Command::Week)));
}

#[test]
fn test_commands_with_bot_mention() {
    let result = Command::parse("/day@testbot", "testbot");
    assert!(matches!(result, Ok(Command::Day)));
}

#[test]
fn test_link_entry_is_not_a_bot_command() {
    // `/link@7` targets a lesson id, not a bot mention; it is handled by
    // the plain-text branch instead.
    assert!(Command::parse("/link@7", "testbot").is_err());
}

#[test]
fn test_unknown_command_fails() {
    assert!(Command::parse("/unknown", "testbot").is_err());
}

#[test]
fn test_descriptions_list_every_command() {
    let descriptions = Command::descriptions().to_string();
    for command in ["/help", "/start", "/change_group", "/day", "/week"] {
        assert!(descriptions.contains(command), "missing {command}");
    }
}
