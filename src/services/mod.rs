/// HTTP health endpoints for deployment probes.
pub mod health;
/// Scheduled tomorrow-timetable broadcast.
pub mod notifier;
