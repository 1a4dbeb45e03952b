//! Update dispatch: commands, plain text and button callbacks.
//!
//! Cross-cutting concerns are explicit here instead of being stacked onto
//! handlers: every update starts with
//! [`crate::database::models::User::acquire`], moderation callbacks pass a
//! moderator-only guard, and session open/close follows the [`Transition`]
//! each handler returns.

pub mod basic;
pub mod callback;
pub mod group_selection;
pub mod link;
pub mod message;
pub mod moderation;
pub mod timetable;

use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;

use crate::bot::session::{SessionStore, Transition};
use crate::bot::states::StateRegistry;
use crate::database::connection::DatabaseManager;
use crate::error::BotError;

/// Everything a handler needs, threaded explicitly.
#[derive(Clone)]
pub struct BotContext {
    /// Telegram API handle.
    pub bot: Bot,
    /// Storage handle; each invocation transacts on the shared pool.
    pub db: DatabaseManager,
    /// Per-user conversation sessions.
    pub sessions: SessionStore,
    /// Compiled conversation states.
    pub states: Arc<StateRegistry>,
}

/// Builds the dptree schema wiring updates to handlers.
pub struct BotHandler {
    ctx: BotContext,
}

impl BotHandler {
    /// Compiles the state registry and sets up shared dispatch state.
    pub fn new(bot: Bot, db: DatabaseManager) -> Result<Self, BotError> {
        Ok(Self {
            ctx: BotContext {
                bot,
                db,
                sessions: SessionStore::new(),
                states: Arc::new(StateRegistry::new()?),
            },
        })
    }

    /// The dispatch tree: commands first, then plain text (the `/link@{id}`
    /// entry and `LinkWait` input), then button callbacks.
    pub fn schema(&self) -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
        let ctx_command = self.ctx.clone();
        let ctx_text = self.ctx.clone();
        let ctx_callback = self.ctx.clone();

        dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<crate::bot::commands::Command>()
                    .endpoint(move |msg: Message, cmd: crate::bot::commands::Command| {
                        let ctx = ctx_command.clone();
                        async move {
                            message::command_handler(&ctx, msg, cmd)
                                .await
                                .map_err(Into::into)
                        }
                    }),
            )
            .branch(Update::filter_message().endpoint(move |msg: Message| {
                let ctx = ctx_text.clone();
                async move { message::text_handler(&ctx, msg).await.map_err(Into::into) }
            }))
            .branch(Update::filter_callback_query().endpoint(move |q: CallbackQuery| {
                let ctx = ctx_callback.clone();
                async move { callback::callback_handler(&ctx, q).await.map_err(Into::into) }
            }))
    }
}

/// Applies a handler's outcome and keeps recoverable failures local: they
/// are logged, never crash the worker, and leave the conversation state
/// untouched.
pub(crate) fn finish(ctx: &BotContext, user_id: i64, result: Result<Transition, BotError>) {
    match result {
        Ok(transition) => ctx.sessions.apply(user_id, transition),
        Err(
            err @ (BotError::Validation(_)
            | BotError::NotFound(_)
            | BotError::AlreadyResolved
            | BotError::PermissionDenied),
        ) => {
            tracing::debug!("Handler no-op for user {}: {}", user_id, err);
        }
        Err(BotError::Delivery(err)) => {
            tracing::warn!("Delivery failed for user {}: {}", user_id, err);
        }
        Err(err) => {
            tracing::error!("Handler failed for user {}: {}", user_id, err);
        }
    }
}

/// Telegram rejects edits that would leave a message unchanged; callers
/// treat that as success.
pub(crate) fn is_message_not_modified(err: &teloxide::RequestError) -> bool {
    matches!(
        err,
        teloxide::RequestError::Api(teloxide::ApiError::MessageNotModified)
    )
}
