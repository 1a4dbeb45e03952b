//! # University Timetable Bot
//!
//! A Telegram bot that keeps students' university timetables: day and week
//! views, subgroup-aware lesson visibility, moderated lesson-link changes
//! and an evening broadcast of tomorrow's lessons.
//!
//! ## Features
//! - Guided group selection: course, faculty, group, then one question per
//!   subgroup-split lesson
//! - /day and /week timetables with prev/today/next navigation
//! - Lesson links changed through the group moderator's approval
//! - Daily broadcast of the next day's timetable
//! - Persistent storage with SQLite

/// Bot command handlers, conversation states and message processing
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and migrations
pub mod database;
/// Error types shared across the bot
pub mod error;
/// Background services: health endpoints and the timetable broadcast
pub mod services;
/// Utility functions for datetime handling and HTML rendering
pub mod utils;
