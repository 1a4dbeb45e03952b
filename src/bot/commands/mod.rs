use teloxide::utils::command::BotCommands;

/// Slash commands; each one is a conversation entry point.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "snake_case", description = "Timetable bot commands:")]
pub enum Command {
    /// Show the help message.
    #[command(description = "Display this help message")]
    Help,
    /// First contact; reuses the group-selection graph for new users.
    #[command(description = "Start the bot")]
    Start,
    /// Re-run course/faculty/group/subgroup selection.
    #[command(description = "Move to another group/subgroup")]
    ChangeGroup,
    /// Day timetable with navigation.
    #[command(description = "Timetable for a day")]
    Day,
    /// Week timetable with navigation.
    #[command(description = "Timetable for a week")]
    Week,
}
