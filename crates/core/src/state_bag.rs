// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The State Bag (C1): a typed, concurrent key/value map shared across the
//! steps of one Build.
//!
//! Values are stored type-erased behind `Any` and recovered with a typed
//! `get::<T>`. A handful of reserved keys (`error`, `cancelled`, `halted`,
//! `debug`, `force`, ...) have dedicated read/write helpers so cleanup steps
//! can inspect them without caring about the value's concrete Rust type.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use thiserror::Error;

/// Returned by [`StateBag::get_and_assert`] when the key is absent.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("missing required state bag key: {0}")]
pub struct MissingStateKey(pub String);

/// Reserved key: the most recent fatal error recorded by a step, if any.
pub const KEY_ERROR: &str = "error";
/// Reserved key: marker set once the build's cancellation token has fired.
pub const KEY_CANCELLED: &str = "cancelled";
/// Reserved key: marker set once a step has returned `Halt`.
pub const KEY_HALTED: &str = "halted";
/// Reserved key: debug-mode flag (disables coordinator parallelism, enables pause-after-step).
pub const KEY_DEBUG: &str = "debug";
/// Reserved key: `-force` flag, propagated by the Coordinator before Run.
pub const KEY_FORCE: &str = "force";
/// Reserved key: the current build's resolved name, set by the Coordinator
/// before Run so hook subscribers (notably the Provisioner Driver) can
/// evaluate their own `only`/`except` filters without a separate parameter.
pub const KEY_BUILD_NAME: &str = "build_name";
/// Reserved key: the live Communicator for this Build's Run, set by the
/// Builder before firing the `provision` hook event. A nil payload for
/// `provision` is fatal (§4.4) — the engine surfaces that as a missing key.
pub const KEY_COMMUNICATOR: &str = "communicator";

/// Typed, concurrent key/value map scoped to one Build's Run.
///
/// A single reader/writer lock (`parking_lot::RwLock`) guards the backing
/// map; this is sufficient because steps within a Build execute strictly
/// sequentially (only their internally-spawned helpers run concurrently,
/// and those only touch the bag through `&StateBag`, which is `Sync`).
pub struct StateBag {
    entries: RwLock<HashMap<String, Box<dyn Any + Send + Sync>>>,
}

impl fmt::Debug for StateBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.entries.read().keys().map(String::as_str).collect();
        f.debug_struct("StateBag").field("keys", &keys).finish()
    }
}

impl Default for StateBag {
    fn default() -> Self {
        Self::new()
    }
}

impl StateBag {
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }

    /// Store a value under `key`, overwriting any prior value (of any type).
    pub fn put<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.entries.write().insert(key.into(), Box::new(value));
    }

    /// Fetch a clone of the value stored under `key`, if present and of type `T`.
    ///
    /// Returns `None` both when the key is absent and when it holds a value
    /// of a different type — callers that need to distinguish the two
    /// should use [`StateBag::contains`] first.
    pub fn get<T: Any + Send + Sync + Clone>(&self, key: &str) -> Option<T> {
        self.entries.read().get(key).and_then(|v| v.downcast_ref::<T>()).cloned()
    }

    /// Like [`StateBag::get`] but fails with [`MissingStateKey`] when absent.
    pub fn get_and_assert<T: Any + Send + Sync + Clone>(
        &self,
        key: &str,
    ) -> Result<T, MissingStateKey> {
        self.get(key).ok_or_else(|| MissingStateKey(key.to_string()))
    }

    /// Remove and return the value stored under `key`, if present and of type `T`.
    pub fn remove<T: Any + Send + Sync>(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.write();
        let boxed = entries.remove(key)?;
        match boxed.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(boxed) => {
                // Wrong type: put it back so callers that expect the key to
                // still exist (under its original type) aren't surprised.
                entries.insert(key.to_string(), boxed);
                None
            }
        }
    }

    /// Whether any value (of any type) is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    // --- Reserved-key helpers -------------------------------------------------
    //
    // These give cleanup steps a type-stable way to read the handful of
    // well-known keys from S6 without reaching for `get::<String>` /
    // `get::<bool>` and hoping the writer used the same type.

    /// The most recent fatal error recorded by a step, if any.
    pub fn error(&self) -> Option<String> {
        self.get::<String>(KEY_ERROR)
    }

    /// Record a fatal error under the reserved `error` key.
    pub fn set_error(&self, message: impl Into<String>) {
        self.put(KEY_ERROR, message.into());
    }

    /// Whether the build's cancellation token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.get::<bool>(KEY_CANCELLED).unwrap_or(false)
    }

    pub fn set_cancelled(&self) {
        self.put(KEY_CANCELLED, true);
    }

    /// Whether some step has returned the `Halt` directive.
    pub fn is_halted(&self) -> bool {
        self.get::<bool>(KEY_HALTED).unwrap_or(false)
    }

    pub fn set_halted(&self) {
        self.put(KEY_HALTED, true);
    }

    /// Whether debug mode is enabled for this Build.
    pub fn is_debug(&self) -> bool {
        self.get::<bool>(KEY_DEBUG).unwrap_or(false)
    }

    /// Whether `-force` was passed for this Build.
    pub fn is_force(&self) -> bool {
        self.get::<bool>(KEY_FORCE).unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "state_bag_tests.rs"]
mod tests;
