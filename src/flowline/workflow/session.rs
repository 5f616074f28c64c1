// SPDX-License-Identifier: MIT

//! Single-run guard for a host session

use crate::adk::error::WorkflowError;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// Allows at most one active run at a time
#[derive(Clone, Default)]
pub struct Session {
    active: Arc<Mutex<Option<CancellationToken>>>,
}

/// Held for the duration of a run; releases the session on drop
pub struct RunGuard {
    active: Arc<Mutex<Option<CancellationToken>>>,
    token: CancellationToken,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        lock(&self.active)
    }

    /// Claim the session for a new run
    pub fn try_begin(&self) -> Result<RunGuard, WorkflowError> {
        let mut slot = self.slot();
        if slot.is_some() {
            return Err(WorkflowError::RunInProgress);
        }
        let token = CancellationToken::new();
        *slot = Some(token.clone());
        Ok(RunGuard {
            active: self.active.clone(),
            token,
        })
    }

    pub fn is_running(&self) -> bool {
        self.slot().is_some()
    }

    /// Cancel the active run; returns false when nothing was running
    pub fn cancel_active(&self) -> bool {
        match self.slot().as_ref() {
            Some(token) => {
                log::info!("Cancelling active run");
                token.cancel();
                true
            }
            None => false,
        }
    }
}

impl RunGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        lock(&self.active).take();
    }
}

// A panicking run must not wedge the session
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
