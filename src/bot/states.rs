//! Conversation states and the callback token codec.
//!
//! Every conversational step is a [`ConversationState`]: a stable name, a
//! build template with positional `{}` placeholders, and an anchored parse
//! regex whose capture groups recover the arguments. Tokens are embedded in
//! inline-keyboard buttons, so the templates are process-wide constants:
//! buttons delivered before a restart must still parse after it.
//!
//! No two callback states accept the same string; the dispatcher relies on
//! this to route a click by pattern alone. The property is covered by tests.

use regex::Regex;

use crate::error::BotError;

/// Callback token that cancels the active conversation from a footer button.
pub const CANCEL: &str = "cancel";

/// Identifies a conversational step. The terminal END is not a state; it is
/// expressed by [`crate::bot::session::Transition::End`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateId {
    /// User picks their course number.
    SelectCourse,
    /// User picks their faculty.
    SelectFaculty,
    /// User picks their students group.
    SelectGroup,
    /// User resolves one ambiguous lesson's subgroup; re-entered per lesson.
    SelectSubgroups,
    /// Day timetable with prev/today/next navigation.
    TimetableDaySelection,
    /// Week timetable with prev/today/next navigation.
    TimetableWeekSelection,
    /// Waiting for the user to type a new lesson link.
    LinkWait,
    /// Moderator accepts a lesson-link request (conversation-independent).
    ModeratorAcceptLink,
    /// Moderator rejects a lesson-link request (conversation-independent).
    ModeratorRejectLink,
}

/// One conversational step: how to build its callback tokens and how to
/// recognize them.
#[derive(Debug, Clone)]
pub struct ConversationState {
    /// Registry key.
    pub id: StateId,
    /// Stable name, used in logs and error messages.
    pub name: &'static str,
    build_template: &'static str,
    parse_pattern: Regex,
    /// Text-input states consume typed messages instead of button callbacks
    /// and never participate in callback dispatch.
    pub text_input: bool,
}

impl ConversationState {
    fn new(
        id: StateId,
        name: &'static str,
        build_template: &'static str,
        parse_pattern: &str,
    ) -> Result<Self, BotError> {
        Ok(Self {
            id,
            name,
            build_template,
            parse_pattern: Regex::new(parse_pattern)?,
            text_input: matches!(id, StateId::LinkWait),
        })
    }

    /// Formats the build template with `args`. The single entry point for
    /// producing callback tokens.
    pub fn build(&self, args: &[&str]) -> Result<String, BotError> {
        let parts: Vec<&str> = self.build_template.split("{}").collect();
        let expected = parts.len() - 1;
        if args.len() != expected {
            return Err(BotError::Format {
                state: self.name,
                expected,
                got: args.len(),
            });
        }
        let mut token = String::new();
        for (i, part) in parts.iter().enumerate() {
            token.push_str(part);
            if i < args.len() {
                token.push_str(args[i]);
            }
        }
        Ok(token)
    }

    /// Matches `token` against the parse pattern, returning the captured
    /// groups, or `None` if the token belongs to some other state.
    pub fn parse(&self, token: &str) -> Option<Vec<String>> {
        self.parse_pattern.captures(token).map(|caps| {
            caps.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().to_string())
                .collect()
        })
    }
}

/// All conversation states, compiled once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct StateRegistry {
    /// Course selection step.
    pub select_course: ConversationState,
    /// Faculty selection step.
    pub select_faculty: ConversationState,
    /// Group selection step.
    pub select_group: ConversationState,
    /// Subgroup selection step.
    pub select_subgroups: ConversationState,
    /// Day timetable navigation.
    pub timetable_day_selection: ConversationState,
    /// Week timetable navigation.
    pub timetable_week_selection: ConversationState,
    /// Link text input step.
    pub link_wait: ConversationState,
    /// Accept button of a link-change request.
    pub moderator_accept_link: ConversationState,
    /// Reject button of a link-change request.
    pub moderator_reject_link: ConversationState,
    /// Entry pattern for the `/link@{id}` message command.
    pub link_command: Regex,
}

impl StateRegistry {
    /// Compiles every state pattern. Fails fast on a bad pattern instead of
    /// panicking mid-dispatch.
    pub fn new() -> Result<Self, BotError> {
        Ok(Self {
            select_course: ConversationState::new(
                StateId::SelectCourse,
                "select_student_course",
                "course_{}",
                r"^course_(\d+)$",
            )?,
            select_faculty: ConversationState::new(
                StateId::SelectFaculty,
                "select_student_faculty",
                "faculty_{}",
                r"^faculty_(\d+)$",
            )?,
            select_group: ConversationState::new(
                StateId::SelectGroup,
                "select_student_group",
                "group_{}",
                r"^group_(\d+)$",
            )?,
            select_subgroups: ConversationState::new(
                StateId::SelectSubgroups,
                "select_subgroups",
                "subgroup_{}",
                r"^subgroup_(\w+)$",
            )?,
            timetable_day_selection: ConversationState::new(
                StateId::TimetableDaySelection,
                "timetable_day_selection",
                "tt_day_selection_{}",
                r"^tt_day_selection_(\d{4}-\d{2}-\d{2})$",
            )?,
            timetable_week_selection: ConversationState::new(
                StateId::TimetableWeekSelection,
                "timetable_week_selection",
                "tt_week_selection_{}",
                r"^tt_week_selection_(\d{4}-\d{2}-\d{2})$",
            )?,
            link_wait: ConversationState::new(
                StateId::LinkWait,
                "link_wait",
                "{}",
                r"^(.+)$",
            )?,
            moderator_accept_link: ConversationState::new(
                StateId::ModeratorAcceptLink,
                "moderator_accept_lesson_link",
                "accept_lesson_link_{}",
                r"^accept_lesson_link_(\d+)$",
            )?,
            moderator_reject_link: ConversationState::new(
                StateId::ModeratorRejectLink,
                "moderator_reject_lesson_link",
                "reject_lesson_link_{}",
                r"^reject_lesson_link_(\d+)$",
            )?,
            link_command: Regex::new(r"^/link@(\d+)$")?,
        })
    }

    /// Looks a state up by id.
    pub fn get(&self, id: StateId) -> &ConversationState {
        match id {
            StateId::SelectCourse => &self.select_course,
            StateId::SelectFaculty => &self.select_faculty,
            StateId::SelectGroup => &self.select_group,
            StateId::SelectSubgroups => &self.select_subgroups,
            StateId::TimetableDaySelection => &self.timetable_day_selection,
            StateId::TimetableWeekSelection => &self.timetable_week_selection,
            StateId::LinkWait => &self.link_wait,
            StateId::ModeratorAcceptLink => &self.moderator_accept_link,
            StateId::ModeratorRejectLink => &self.moderator_reject_link,
        }
    }

    /// States reachable through button callbacks, in dispatch-priority order.
    pub fn callback_states(&self) -> [&ConversationState; 8] {
        [
            &self.moderator_accept_link,
            &self.moderator_reject_link,
            &self.select_course,
            &self.select_faculty,
            &self.select_group,
            &self.select_subgroups,
            &self.timetable_day_selection,
            &self.timetable_week_selection,
        ]
    }
}
