//! Entity models. Reference timetable data (faculties, groups, teachers,
//! lessons, dated occurrences) is populated by the external importer and
//! read-only to the bot, except lesson links and subgroup memberships.

pub mod faculty;
pub mod group;
pub mod lesson;
pub mod request;
pub mod user;

pub use faculty::*;
pub use group::*;
pub use lesson::*;
pub use request::*;
pub use user::*;
