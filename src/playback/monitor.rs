use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::{PlaybackToken, Player};

/// Background wait for the end of one playback attempt
///
/// The thread blocks in `Player::wait_until_done` and hands the attempt's
/// token to `on_complete` when the wait returns normally. A failed wait is
/// logged and the callback is skipped, leaving the controller untouched.
pub struct CompletionMonitor {
    token: PlaybackToken,
    handle: JoinHandle<()>,
}

impl CompletionMonitor {
    pub fn spawn<F>(
        player: Arc<dyn Player>,
        token: PlaybackToken,
        on_complete: F,
    ) -> std::io::Result<Self>
    where
        F: FnOnce(PlaybackToken) + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(format!("playback-monitor-{}", token.attempt))
            .spawn(move || match player.wait_until_done() {
                Ok(()) => on_complete(token),
                Err(err) => {
                    log::error!("Error waiting for playback to finish: {:#}", err);
                }
            })?;

        Ok(Self { token, handle })
    }

    pub fn token(&self) -> PlaybackToken {
        self.token
    }

    /// Whether the wait is still in progress
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    #[cfg(test)]
    fn join(self) {
        if self.handle.join().is_err() {
            log::error!("Playback monitor {} panicked", self.token.attempt);
        }
    }
}
