//! The message bus.
//!
//! `handle` runs a FIFO queue seeded with one inbound message. Every command
//! and every event handler runs in its own unit of work; the events a handler
//! publishes are appended to the queue until nothing is left to react to.

use std::collections::VecDeque;

use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use super::command_handlers;
use super::dispatch::handlers_for;
use super::error::ServiceError;
use super::event_handlers;
use super::messages::Message;
use super::ports::Services;
use super::unit_of_work::UnitOfWork;
use crate::domain::commands::GameCommand;
use crate::domain::events::GameEvent;
use conquiz_core::command::Command;

/// Drives commands and their follow-up events to quiescence.
#[derive(Clone)]
pub struct MessageBus {
    services: Services,
}

impl MessageBus {
    /// Creates a bus over `services`.
    #[must_use]
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Returns the collaborators of this bus.
    #[must_use]
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Handles `message` and everything it causes, returning every event
    /// produced along the way in publication order.
    ///
    /// A failing handler rolls back its own unit of work and stops the
    /// cascade; earlier hops stay committed.
    ///
    /// # Errors
    ///
    /// Returns the first `ServiceError` raised by a handler.
    #[instrument(skip_all, fields(game_id = %message.game_id()))]
    pub async fn handle(&self, message: Message) -> Result<Vec<GameEvent>, ServiceError> {
        let correlation_id = match &message {
            Message::Command(_) => Uuid::new_v4(),
            Message::Event(event) => event.metadata.correlation_id,
        };
        let mut queue = VecDeque::from([message]);
        let mut produced = Vec::new();

        while let Some(message) = queue.pop_front() {
            let result = match &message {
                Message::Command(command) => self.handle_command(command, correlation_id).await,
                Message::Event(event) => self.handle_event(event).await,
            };
            let events = result.inspect_err(|err| {
                if err.is_internal_fault() {
                    error!(error = %err, "handler failed");
                } else {
                    warn!(error = %err, "action rejected");
                }
            })?;
            queue.extend(events.iter().cloned().map(Message::Event));
            produced.extend(events);
        }

        Ok(produced)
    }

    /// Convenience wrapper for [`MessageBus::handle`] with a command.
    ///
    /// # Errors
    ///
    /// See [`MessageBus::handle`].
    pub async fn dispatch(&self, command: GameCommand) -> Result<Vec<GameEvent>, ServiceError> {
        self.handle(Message::Command(command)).await
    }

    async fn handle_command(
        &self,
        command: &GameCommand,
        correlation_id: Uuid,
    ) -> Result<Vec<GameEvent>, ServiceError> {
        debug!(
            command_type = command.command_type(),
            aggregate_id = %command.aggregate_id(),
            "handling command"
        );
        let ctx = self.services.context(correlation_id, correlation_id);
        let mut uow = UnitOfWork::new(&self.services);
        let result = command_handlers::handle(command, &mut uow, &ctx).await;
        finish(&mut uow, result).await
    }

    async fn handle_event(&self, event: &GameEvent) -> Result<Vec<GameEvent>, ServiceError> {
        let handlers = handlers_for(&event.kind);
        debug!(event_type = event.kind.event_type(), handlers = handlers.len(), "handling event");
        let ctx = self
            .services
            .context(event.metadata.correlation_id, event.metadata.event_id);

        let mut published = Vec::new();
        for handler in handlers {
            let mut uow = UnitOfWork::new(&self.services);
            let result = event_handlers::handle(*handler, event, &mut uow, &ctx).await;
            published.extend(finish(&mut uow, result).await?);
        }
        Ok(published)
    }
}

/// Commits and publishes after a successful handler, rolls back otherwise.
async fn finish(
    uow: &mut UnitOfWork<'_>,
    result: Result<(), ServiceError>,
) -> Result<Vec<GameEvent>, ServiceError> {
    if let Err(err) = result {
        uow.rollback();
        return Err(err);
    }
    if let Err(err) = uow.commit().await {
        uow.rollback();
        return Err(err);
    }
    uow.publish_events().await
}
