//! Database connection management and entity models.

pub mod connection;
pub mod models;
