//! Error taxonomy for the bot.
//!
//! Recoverable conditions (stale callbacks, missing entities, absent
//! moderators) are typed so the dispatch layer can decide what the user
//! sees; only programmer-error-class failures bubble up to the outer
//! dispatch loop, where they are logged.

use thiserror::Error;

/// Errors produced by handlers and the moderation protocol.
#[derive(Debug, Error)]
pub enum BotError {
    /// A callback or message argument did not validate against the database.
    #[error("invalid {0}")]
    Validation(&'static str),

    /// A referenced entity no longer exists.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The request was already accepted or rejected; treated as a benign no-op.
    #[error("request already resolved")]
    AlreadyResolved,

    /// The target group has no user flagged as moderator.
    #[error("group has no moderator")]
    NoModerator,

    /// A moderator-only handler was invoked by a regular user.
    #[error("moderator privilege required")]
    PermissionDenied,

    /// `ConversationState::build` was called with the wrong argument count.
    #[error("callback template for {state} takes {expected} argument(s), got {got}")]
    Format {
        /// State whose template was being built.
        state: &'static str,
        /// Placeholders in the template.
        expected: usize,
        /// Arguments supplied by the caller.
        got: usize,
    },

    /// Message delivery failed; committed durable writes are not rolled back.
    #[error("telegram delivery failed: {0}")]
    Delivery(#[from] teloxide::RequestError),

    /// Storage failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A request's meta payload could not be decoded.
    #[error("malformed request meta: {0}")]
    Meta(#[from] serde_json::Error),

    /// A state parse pattern failed to compile at startup.
    #[error("invalid state pattern: {0}")]
    Pattern(#[from] regex::Error),
}
