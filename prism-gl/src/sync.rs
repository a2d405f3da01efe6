//! Fences and semaphores.
//!
//! A fence wraps a GL sync object inserted at submit time; waiting maps the
//! `glClientWaitSync` result onto success / timeout / device-lost. Semaphores
//! carry no scheduling weight on a backend with a single implicit command
//! stream: they are validation-only bookkeeping that catches signal/wait
//! misuse in debug builds.

use crate::api as gl;
use crate::api::types::*;
use crate::context::ContextGuard;
use prism::{Error, Result, WaitResult};
use std::cell::Cell;

pub struct GlFence {
    sync: Cell<Option<GLsync>>,
}

// sync objects are plain driver handles; all use is guarded by the
// single-current-thread contract
unsafe impl Send for GlFence {}

impl GlFence {
    pub(crate) fn new() -> GlFence {
        GlFence {
            sync: Cell::new(None),
        }
    }

    /// Inserts the fence-signal operation into the command stream. Called by
    /// `Queue::submit`.
    pub(crate) fn arm(&self, guard: &ContextGuard) {
        if let Some(old) = self.sync.take() {
            unsafe {
                guard.gl().DeleteSync(old);
            }
        }
        let sync = unsafe { guard.gl().FenceSync(gl::SYNC_GPU_COMMANDS_COMPLETE, 0) };
        self.sync.set(Some(sync));
    }

    /// Waits for the fence with a timeout in nanoseconds;
    /// [prism::error::WAIT_FOREVER] waits indefinitely.
    pub fn wait(&self, guard: &ContextGuard, timeout_ns: u64) -> Result<WaitResult> {
        let sync = match self.sync.get() {
            Some(s) => s,
            None => {
                // never submitted: nothing will ever signal it
                warn!("waiting on a fence that was never submitted");
                return Ok(WaitResult::Timeout);
            }
        };
        let result = unsafe {
            guard
                .gl()
                .ClientWaitSync(sync, gl::SYNC_FLUSH_COMMANDS_BIT, timeout_ns)
        };
        match result {
            gl::ALREADY_SIGNALED | gl::CONDITION_SATISFIED => Ok(WaitResult::Success),
            gl::TIMEOUT_EXPIRED => Ok(WaitResult::Timeout),
            _ => Err(Error::DeviceLost),
        }
    }

    pub fn is_signaled(&self, guard: &ContextGuard) -> Result<bool> {
        Ok(self.wait(guard, 0)? == WaitResult::Success)
    }

    pub fn reset(&self, guard: &ContextGuard) {
        if let Some(sync) = self.sync.take() {
            unsafe {
                guard.gl().DeleteSync(sync);
            }
        }
    }

    pub fn destroy(&self, guard: &ContextGuard) {
        self.reset(guard);
    }
}

//--------------------------------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum SemaphoreState {
    Idle,
    Signaled,
}

/// Debug bookkeeping only; GL's single in-order command stream provides the
/// actual ordering.
pub struct GlSemaphore {
    state: Cell<SemaphoreState>,
}

impl GlSemaphore {
    pub(crate) fn new() -> GlSemaphore {
        GlSemaphore {
            state: Cell::new(SemaphoreState::Idle),
        }
    }

    pub(crate) fn note_signal(&self) {
        debug_assert_ne!(
            self.state.get(),
            SemaphoreState::Signaled,
            "semaphore signaled twice without an intervening wait"
        );
        self.state.set(SemaphoreState::Signaled);
    }

    pub(crate) fn note_wait(&self) {
        debug_assert_eq!(
            self.state.get(),
            SemaphoreState::Signaled,
            "waiting on a semaphore that is not signaled"
        );
        self.state.set(SemaphoreState::Idle);
    }
}
