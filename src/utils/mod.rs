//! Utility functions for dates, HTML escaping and timetable rendering.

pub mod datetime;
pub mod html;
pub mod timetable;
