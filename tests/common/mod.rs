// Shared test doubles for playback integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use tonegen::platform::DeviceProgress;
use tonegen::playback::Player;

/// Player that never touches a device. Output "ends" when the test calls
/// `finish_playback`, or when it is stopped.
pub struct ScriptedPlayer {
    progress: DeviceProgress,
    epoch: Mutex<u64>,
    pub plays: Mutex<Vec<(usize, u32)>>,
    pub stops: AtomicUsize,
    pub fail_play: AtomicBool,
    pub fail_stop: AtomicBool,
}

impl ScriptedPlayer {
    pub fn new() -> Self {
        Self {
            progress: DeviceProgress::new(),
            epoch: Mutex::new(0),
            plays: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            fail_play: AtomicBool::new(false),
            fail_stop: AtomicBool::new(false),
        }
    }

    /// Simulate the device reaching the end of the current output
    pub fn finish_playback(&self) {
        let epoch = *self.epoch.lock().unwrap();
        self.progress.complete(epoch);
    }

    /// Simulate a device fault during the current output
    pub fn fail_playback(&self, message: &str) {
        let epoch = *self.epoch.lock().unwrap();
        self.progress.fail(epoch, message.to_string());
    }

    pub fn play_lengths(&self) -> Vec<usize> {
        self.plays.lock().unwrap().iter().map(|(len, _)| *len).collect()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl Player for ScriptedPlayer {
    fn play(&self, samples: &[f32], sample_rate: u32) -> anyhow::Result<()> {
        if self.fail_play.load(Ordering::SeqCst) {
            anyhow::bail!("output device rejected the stream");
        }
        self.plays.lock().unwrap().push((samples.len(), sample_rate));
        *self.epoch.lock().unwrap() = self.progress.begin();
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.progress.finish();
        if self.fail_stop.load(Ordering::SeqCst) {
            anyhow::bail!("stop was not acknowledged");
        }
        Ok(())
    }

    fn wait_until_done(&self) -> anyhow::Result<()> {
        self.progress.wait()
    }
}

/// Poll `condition` until it holds or two seconds pass
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
