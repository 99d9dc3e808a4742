// Copyright (c) the opaque-core authors.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! The `CredentialStore`/`SessionStore` contracts and a
//! `MemoryStore` reference implementation.
//!
//! The core never implements durability, replication, or transport itself —
//! these traits are the narrow interface external collaborators (an HTTP
//! handler backed by a real database, a Redis-backed session cache) satisfy.
//! `MemoryStore` exists for this crate's own integration tests and for
//! deployments simple enough not to need a standalone store.

use alloc::vec::Vec;

use crate::errors::{Error, ResourceExhausted};

/// Default cap on pending sessions, bounding memory growth under a flood
/// of half-completed authentication attempts.
pub const DEFAULT_MAX_PENDING_SESSIONS: usize = 10_000;

/// Registration records, keyed by opaque credential identifier bytes.
///
/// Implementations own durability and concurrency; the core only calls
/// `store`/`load`/`delete` with already-serialized
/// [`crate::messages::RegistrationRecord`] bytes.
pub trait CredentialStore {
    /// Persists `record` under `cred_id`, replacing any existing record.
    fn store(&self, cred_id: &[u8], record: &[u8]) -> Result<(), Error>;

    /// Loads the record for `cred_id`, or `None` if unregistered.
    fn load(&self, cred_id: &[u8]) -> Result<Option<Vec<u8>>, Error>;

    /// Deletes the record for `cred_id`, if any.
    fn delete(&self, cred_id: &[u8]) -> Result<(), Error>;
}

/// Transient per-session server-side authentication state, keyed by an
/// opaque token handed back to the client alongside `KE2`.
///
/// Implementations own TTL eviction; the core only calls `store` with a
/// caller-chosen `ttl` (interpreted as implementation-defined time units —
/// e.g. seconds — this trait does not fix a clock) and `load`/`revoke`.
pub trait SessionStore<S> {
    /// Stores `state` under `token`, indexed by `cred_id` for
    /// [`Self::revoke_by_credential`], with the given time-to-live, failing
    /// with [`ResourceExhausted::SessionStoreFull`] once the implementation's
    /// pending-session cap is reached.
    fn store(&self, token: &[u8], cred_id: &[u8], state: S, ttl: u64) -> Result<(), Error>;

    /// Loads and removes the state for `token` — a `ServerAuthState` is
    /// consumed by the single `serverFinish` call that follows it, since
    /// within a single authentication the messages must be processed
    /// strictly in order.
    fn load(&self, token: &[u8]) -> Result<Option<S>, Error>;

    /// Revokes a pending session without consuming it, e.g. on client abort.
    fn revoke(&self, token: &[u8]) -> Result<(), Error>;

    /// Revokes every pending session stored under `cred_id`, e.g. after
    /// a password change invalidates in-flight logins.
    fn revoke_by_credential(&self, cred_id: &[u8]) -> Result<(), Error>;
}

/// An in-memory, process-local `CredentialStore` and `SessionStore<S>`,
/// suitable for tests and single-process deployments. Not durable across
/// restarts and not suitable for a multi-process deployment.
#[cfg(feature = "std")]
pub struct MemoryStore<S> {
    credentials: std::sync::Mutex<std::collections::HashMap<Vec<u8>, Vec<u8>>>,
    sessions: std::sync::Mutex<std::collections::HashMap<Vec<u8>, (S, Vec<u8>)>>,
    max_pending_sessions: usize,
}

#[cfg(feature = "std")]
impl<S> Default for MemoryStore<S> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PENDING_SESSIONS)
    }
}

#[cfg(feature = "std")]
impl<S> MemoryStore<S> {
    /// Builds an empty store with the given pending-session cap.
    pub fn new(max_pending_sessions: usize) -> Self {
        Self {
            credentials: std::sync::Mutex::new(std::collections::HashMap::new()),
            sessions: std::sync::Mutex::new(std::collections::HashMap::new()),
            max_pending_sessions,
        }
    }
}

#[cfg(feature = "std")]
impl<S> CredentialStore for MemoryStore<S> {
    fn store(&self, cred_id: &[u8], record: &[u8]) -> Result<(), Error> {
        self.credentials
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(cred_id.to_vec(), record.to_vec());
        Ok(())
    }

    fn load(&self, cred_id: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        Ok(self
            .credentials
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(cred_id)
            .cloned())
    }

    fn delete(&self, cred_id: &[u8]) -> Result<(), Error> {
        self.credentials
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(cred_id);
        Ok(())
    }
}

#[cfg(feature = "std")]
impl<S> SessionStore<S> for MemoryStore<S> {
    fn store(&self, token: &[u8], cred_id: &[u8], state: S, _ttl: u64) -> Result<(), Error> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        if sessions.len() >= self.max_pending_sessions {
            return Err(Error::ResourceExhausted(ResourceExhausted::SessionStoreFull));
        }
        sessions.insert(token.to_vec(), (state, cred_id.to_vec()));
        Ok(())
    }

    fn load(&self, token: &[u8]) -> Result<Option<S>, Error> {
        Ok(self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(token)
            .map(|(state, _)| state))
    }

    fn revoke(&self, token: &[u8]) -> Result<(), Error> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(token);
        Ok(())
    }

    fn revoke_by_credential(&self, cred_id: &[u8]) -> Result<(), Error> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|_, (_, stored_cred_id)| stored_cred_id.as_slice() != cred_id);
        Ok(())
    }
}
