// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Hook Bus (C4): named extension points that builders and the
//! coordinator fire at well-known moments (artifact produced, build
//! cleanup, ...), dispatched in subscriber registration order.

use async_trait::async_trait;
use thiserror::Error;

use crate::state_bag::StateBag;

/// A named moment a [`HookBus`] can fire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookEvent(pub String);

impl HookEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl From<&str> for HookEvent {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A subscriber attached to one or more [`HookEvent`]s.
#[async_trait]
pub trait HookSubscriber: Send + Sync {
    /// Name used in logs when this subscriber fails.
    fn name(&self) -> &str;

    async fn handle(&self, event: &HookEvent, bag: &StateBag) -> Result<(), HookError>;
}

/// Error surfaced by a subscriber; halts dispatch for the firing event.
#[derive(Debug, Error)]
#[error("hook subscriber {subscriber} failed for event {event}: {message}")]
pub struct HookError {
    pub subscriber: String,
    pub event: String,
    pub message: String,
}

impl HookError {
    pub fn new(subscriber: impl Into<String>, event: &HookEvent, message: impl Into<String>) -> Self {
        Self { subscriber: subscriber.into(), event: event.0.clone(), message: message.into() }
    }
}

/// Registers subscribers against named events and dispatches fires to them
/// in registration order. The first subscriber to fail stops dispatch for
/// that fire; later registered events or later fires are unaffected.
#[derive(Default)]
pub struct HookBus {
    subscribers: Vec<(String, Box<dyn HookSubscriber>)>,
}

impl HookBus {
    pub fn new() -> Self {
        Self { subscribers: Vec::new() }
    }

    /// Subscribe to `event`. Multiple subscribers may register for the same
    /// event; they run in the order they were registered.
    pub fn subscribe(&mut self, event: impl Into<String>, subscriber: Box<dyn HookSubscriber>) {
        self.subscribers.push((event.into(), subscriber));
    }

    /// Fire `event`, running every subscriber registered for it in
    /// registration order. Stops and returns the first error encountered.
    pub async fn fire(&self, event: &HookEvent, bag: &StateBag) -> Result<(), HookError> {
        for (registered_event, subscriber) in &self.subscribers {
            if registered_event != &event.0 {
                continue;
            }
            tracing::debug!(event = %event.0, subscriber = subscriber.name(), "hook: dispatch");
            subscriber.handle(event, bag).await?;
        }
        Ok(())
    }

    /// Whether any subscriber is registered for `event`.
    pub fn has_subscribers(&self, event: &HookEvent) -> bool {
        self.subscribers.iter().any(|(name, _)| name == &event.0)
    }
}

#[cfg(test)]
#[path = "hook_tests.rs"]
mod tests;
