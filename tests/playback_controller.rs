// Integration tests for the playback state machine

mod common;

use std::sync::atomic::Ordering;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{wait_for, ScriptedPlayer};
use tonegen::gen::tone::generate_tone;
use tonegen::gen::waveform::Waveform;
use tonegen::playback::{ManualClock, PlaybackController, PlaybackEvent, PlaybackStatus};
use tonegen::{PlaybackError, WaveformBuffer};

struct Rig {
    controller: PlaybackController,
    events: Receiver<PlaybackEvent>,
    player: Arc<ScriptedPlayer>,
    clock: Arc<ManualClock>,
}

fn rig() -> Rig {
    let player = Arc::new(ScriptedPlayer::new());
    let clock = Arc::new(ManualClock::new());
    let (controller, events) = PlaybackController::new(player.clone(), clock.clone());
    Rig {
        controller,
        events,
        player,
        clock,
    }
}

fn sine_440() -> Arc<WaveformBuffer> {
    Arc::new(generate_tone(Waveform::Sine, 440.0, 2.0, 0.5, 44100).unwrap())
}

#[test]
fn test_stop_with_nothing_loaded_is_noop() {
    let rig = rig();
    rig.controller.stop();

    assert_eq!(rig.controller.status(), PlaybackStatus::Stopped);
    assert_eq!(rig.controller.current_position_estimate(), 0);
    assert_eq!(rig.player.stop_count(), 0);
}

#[test]
fn test_sine_position_estimate_and_frozen_pause() {
    let rig = rig();
    let buffer = sine_440();
    assert_eq!(buffer.len(), 88200);

    rig.controller.load(buffer);
    rig.controller.start().unwrap();
    assert_eq!(rig.controller.status(), PlaybackStatus::Playing);

    rig.clock.advance(Duration::from_secs(1));
    assert_eq!(rig.controller.current_position_estimate(), 44100);

    rig.controller.pause();
    assert_eq!(rig.controller.status(), PlaybackStatus::Paused);
    let frozen = rig.controller.current_position_estimate();
    assert_eq!(frozen, 44100);

    rig.clock.advance(Duration::from_secs(5));
    assert_eq!(rig.controller.current_position_estimate(), frozen);
    assert_eq!(rig.controller.current_position_estimate(), frozen);
}

#[test]
fn test_resume_continues_from_pause_position() {
    let rig = rig();
    rig.controller.load(sine_440());

    rig.controller.start().unwrap();
    rig.clock.advance(Duration::from_millis(500));
    rig.controller.pause();
    assert_eq!(rig.controller.current_position_estimate(), 22050);

    rig.controller.start().unwrap();
    assert_eq!(rig.controller.current_position_estimate(), 22050);
    assert_eq!(rig.player.play_lengths(), vec![88200, 88200 - 22050]);

    rig.clock.advance(Duration::from_millis(250));
    assert_eq!(rig.controller.current_position_estimate(), 22050 + 11025);
}

#[test]
fn test_estimate_clamps_at_buffer_end() {
    let rig = rig();
    rig.controller.load(sine_440());
    rig.controller.start().unwrap();

    rig.clock.advance(Duration::from_secs(30));
    assert_eq!(rig.controller.current_position_estimate(), 88200);
}

#[test]
fn test_stale_signal_after_stop_is_dropped() {
    let rig = rig();
    rig.controller.load(sine_440());
    rig.controller.start().unwrap();
    let token = rig.controller.current_token().unwrap();

    rig.controller.stop();

    // The stop released the monitor's wait; its completion must be ignored
    assert!(wait_for(|| !rig.controller.is_monitor_active()));
    rig.controller.on_natural_completion(token);

    assert_eq!(rig.controller.status(), PlaybackStatus::Stopped);
    assert_eq!(rig.controller.current_position_estimate(), 0);
    assert!(rig.events.try_recv().is_err());
}

#[test]
fn test_old_attempt_cannot_finish_resumed_playback() {
    let rig = rig();
    rig.controller.load(sine_440());

    rig.controller.start().unwrap();
    let first = rig.controller.current_token().unwrap();
    rig.clock.advance(Duration::from_millis(100));
    rig.controller.pause();
    rig.controller.start().unwrap();
    let second = rig.controller.current_token().unwrap();

    assert_eq!(first.generation, second.generation);
    assert_ne!(first.attempt, second.attempt);

    // Let the paused attempt's monitor wake up, then replay its signal
    thread::sleep(Duration::from_millis(50));
    rig.controller.on_natural_completion(first);

    assert_eq!(rig.controller.status(), PlaybackStatus::Playing);
    assert!(rig.events.try_recv().is_err());
}

#[test]
fn test_natural_completion_fires_one_event() {
    let rig = rig();
    rig.controller.load(sine_440());
    rig.controller.start().unwrap();

    rig.clock.advance(Duration::from_secs(2));
    rig.player.finish_playback();

    assert_eq!(
        rig.events.recv_timeout(Duration::from_secs(2)),
        Ok(PlaybackEvent::Finished)
    );
    assert!(rig.events.recv_timeout(Duration::from_millis(100)).is_err());
    assert_eq!(rig.controller.status(), PlaybackStatus::Stopped);
    assert_eq!(rig.controller.current_position_estimate(), 0);
}

#[test]
fn test_load_while_playing_stops_first() {
    let rig = rig();
    rig.controller.load(sine_440());
    rig.controller.start().unwrap();
    let old = rig.controller.current_token().unwrap();
    rig.clock.advance(Duration::from_millis(700));

    let replacement = Arc::new(generate_tone(Waveform::Square, 220.0, 1.0, 0.5, 44100).unwrap());
    rig.controller.load(replacement.clone());

    assert_eq!(rig.player.stop_count(), 1);
    assert_eq!(rig.controller.status(), PlaybackStatus::Stopped);
    assert_eq!(rig.controller.current_position_estimate(), 0);
    assert_eq!(rig.controller.active_buffer().unwrap().len(), replacement.len());

    assert!(wait_for(|| !rig.controller.is_monitor_active()));
    rig.controller.on_natural_completion(old);
    assert_eq!(rig.controller.status(), PlaybackStatus::Stopped);
    assert!(rig.events.try_recv().is_err());
}

#[test]
fn test_load_while_paused_or_stopped_leaves_device_alone() {
    let rig = rig();
    rig.controller.load(sine_440());
    rig.controller.start().unwrap();
    rig.controller.pause();
    let stops_after_pause = rig.player.stop_count();

    rig.controller.load(sine_440());
    assert_eq!(rig.player.stop_count(), stops_after_pause);
    assert_eq!(rig.controller.status(), PlaybackStatus::Stopped);

    rig.controller.load(sine_440());
    assert_eq!(rig.player.stop_count(), stops_after_pause);
    assert_eq!(rig.controller.current_position_estimate(), 0);
}

#[test]
fn test_device_start_error_keeps_prior_state() {
    let rig = rig();
    rig.controller.load(sine_440());
    rig.controller.start().unwrap();
    rig.clock.advance(Duration::from_millis(250));
    rig.controller.pause();

    rig.player.fail_play.store(true, Ordering::SeqCst);
    let result = rig.controller.start();

    assert!(matches!(result, Err(PlaybackError::DeviceStart(_))));
    assert_eq!(rig.controller.status(), PlaybackStatus::Paused);
    assert_eq!(rig.controller.current_position_estimate(), 11025);
}

#[test]
fn test_stop_error_does_not_lose_position() {
    let rig = rig();
    rig.player.fail_stop.store(true, Ordering::SeqCst);
    rig.controller.load(sine_440());
    rig.controller.start().unwrap();
    rig.clock.advance(Duration::from_millis(1500));

    rig.controller.pause();
    assert_eq!(rig.controller.status(), PlaybackStatus::Paused);
    assert_eq!(rig.controller.current_position_estimate(), 66150);

    rig.controller.stop();
    assert_eq!(rig.controller.status(), PlaybackStatus::Stopped);
    assert_eq!(rig.controller.current_position_estimate(), 0);
}

#[test]
fn test_wait_error_leaves_state_untouched() {
    let rig = rig();
    rig.controller.load(sine_440());
    rig.controller.start().unwrap();

    rig.player.fail_playback("device disconnected");

    assert!(wait_for(|| !rig.controller.is_monitor_active()));
    assert_eq!(rig.controller.status(), PlaybackStatus::Playing);
    assert!(rig.events.try_recv().is_err());
}

#[test]
fn test_position_bounds_over_command_sequences() {
    let rig = rig();
    let buffer = Arc::new(generate_tone(Waveform::Triangle, 300.0, 0.5, 0.5, 8000).unwrap());
    let len = buffer.len();
    rig.controller.load(buffer);

    // Deterministic pseudo-random walk through the commands
    let mut seed: u64 = 0x5eed;
    for _ in 0..400 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        match (seed >> 33) % 4 {
            0 => {
                let _ = rig.controller.start();
            }
            1 => rig.controller.pause(),
            2 => rig.controller.stop(),
            _ => rig.clock.advance(Duration::from_millis((seed >> 40) % 300)),
        }

        let position = rig.controller.current_position_estimate();
        assert!(position <= len, "position {} beyond {}", position, len);
        let snapshot = rig.controller.snapshot();
        assert!(snapshot.position <= len);
        if snapshot.status == PlaybackStatus::Stopped {
            assert_eq!(snapshot.position, 0);
        }
    }
}
