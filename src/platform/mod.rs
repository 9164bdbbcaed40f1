//! Platform audio output
//! This module provides the device-backed `Player` (native CPAL) and the
//! completion bookkeeping shared between a device and its waiters.

use std::sync::{Condvar, Mutex};

struct ProgressState {
    epoch: u64,
    finished: bool,
    fault: Option<String>,
}

/// Completion flag for the output currently owned by a device
///
/// Each started output gets a new epoch. Waiters return once their epoch
/// finishes, faults, or is replaced by a newer output.
pub struct DeviceProgress {
    state: Mutex<ProgressState>,
    changed: Condvar,
}

impl DeviceProgress {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ProgressState {
                epoch: 0,
                finished: true,
                fault: None,
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark the start of a new output and return its epoch
    pub fn begin(&self) -> u64 {
        let mut state = self.lock();
        state.epoch += 1;
        state.finished = false;
        state.fault = None;
        self.changed.notify_all();
        state.epoch
    }

    /// The output of `epoch` played to its end
    pub fn complete(&self, epoch: u64) {
        let mut state = self.lock();
        if state.epoch == epoch {
            state.finished = true;
            self.changed.notify_all();
        }
    }

    /// Whatever is current is over (stopped or never started)
    pub fn finish(&self) {
        let mut state = self.lock();
        state.finished = true;
        self.changed.notify_all();
    }

    /// The output of `epoch` hit a device error
    pub fn fail(&self, epoch: u64, message: String) {
        let mut state = self.lock();
        if state.epoch == epoch && !state.finished {
            state.fault = Some(message);
            self.changed.notify_all();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    /// Block until the current output is over
    pub fn wait(&self) -> Result<(), anyhow::Error> {
        let mut state = self.lock();
        let epoch = state.epoch;

        while state.epoch == epoch && !state.finished && state.fault.is_none() {
            state = self.changed.wait(state).unwrap_or_else(|e| e.into_inner());
        }

        if state.epoch == epoch {
            if let Some(fault) = state.fault.take() {
                return Err(anyhow::anyhow!("Audio device failed: {}", fault));
            }
        }
        Ok(())
    }
}

impl Default for DeviceProgress {
    fn default() -> Self {
        Self::new()
    }
}

// Platform-specific implementations
#[cfg(feature = "native")]
pub mod cpal_output;

#[cfg(feature = "native")]
pub use self::cpal_output::CpalPlayer;
