/* Tone generator - interactive terminal front end.
Generates a waveform or the built-in melody, plots it and plays it on the
default output device with play/pause/stop control.
*/

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType},
};

use tonegen::app::ToneApp;
use tonegen::config::{AppConfig, ToneSettings};
use tonegen::display::{AsciiPlot, Presentation, RenderRequest};
use tonegen::gen::melody::melody_info;
use tonegen::gen::waveform::Waveform;
use tonegen::platform::CpalPlayer;
use tonegen::playback::MonotonicClock;
use tonegen::utils::init_logger;

#[derive(Parser, Debug)]
#[command(name = "tonegen", about = "Monotone sound generator (16-bit)")]
struct Args {
    /// Wave type: sine, square, triangle or sawtooth
    #[arg(short, long, default_value = "sine")]
    wave: Waveform,

    /// Frequency in Hz
    #[arg(short, long, default_value_t = 440.0)]
    frequency: f64,

    /// Duration in seconds
    #[arg(short, long, default_value_t = 2.0)]
    duration: f64,

    /// Amplitude (0-1)
    #[arg(short, long, default_value_t = 0.5)]
    amplitude: f64,

    /// Start with the Happy Birthday melody
    #[arg(short, long)]
    melody: bool,

    /// Note display poll interval in milliseconds
    #[arg(long, default_value_t = 50)]
    poll_ms: u64,
}

impl Args {
    fn into_config(self) -> AppConfig {
        AppConfig {
            tone: ToneSettings {
                waveform: self.wave,
                frequency: self.frequency,
                duration: self.duration,
                amplitude: self.amplitude,
            },
            melody: self.melody,
            poll_interval: Duration::from_millis(self.poll_ms.max(1)),
        }
    }
}

/// Plot that remembers whether it needs drawing
struct TerminalPlot {
    plot: AsciiPlot,
    dirty: bool,
}

impl Presentation for TerminalPlot {
    fn render(&mut self, request: &RenderRequest<'_>) {
        self.plot.render(request);
        self.dirty = true;
    }
}

const FREQUENCY_STEP: f64 = 10.0;

fn render_display(app: &ToneApp<TerminalPlot>) -> io::Result<()> {
    let mut stdout = io::stdout();
    queue!(stdout, cursor::MoveTo(0, 0), Clear(ClearType::All))?;

    let settings = app.settings();
    let buttons = app.buttons();
    let plot = &app.presentation().plot;

    write!(stdout, "\r=== TONE GENERATOR ===\r\n\r\n")?;
    write!(
        stdout,
        "\rWave: {:<9} Frequency: {:>8.1} Hz   Duration: {:.2} s   Amplitude: {:.2}\r\n\r\n",
        settings.waveform, settings.frequency, settings.duration, settings.amplitude
    )?;
    write!(stdout, "\r{}\r\n", plot.title())?;
    for line in plot.lines() {
        write!(stdout, "\r{}\r\n", line)?;
    }

    write!(
        stdout,
        "\r\n\r[{}{}]  [Stop{}]",
        buttons.play_label,
        if buttons.play_enabled { "" } else { " (disabled)" },
        if buttons.stop_enabled { "" } else { " (disabled)" },
    )?;
    if let Some(note) = app.current_note() {
        write!(stdout, "   Now playing: {} ({:.2} Hz)", note.segment.label, note.segment.frequency)?;
    }
    write!(stdout, "\r\n")?;
    if let Some(message) = app.status_message() {
        write!(stdout, "\r{}\r\n", message)?;
    }

    write!(
        stdout,
        "\r\n\rSPACE play/pause  S stop  G generate  M melody  W wave  +/- frequency  Q quit\r\n"
    )?;
    stdout.flush()
}

fn main() -> anyhow::Result<()> {
    init_logger();
    let config = Args::parse().into_config();

    let player = Arc::new(CpalPlayer::new()?);
    let (width, height) = terminal::size().unwrap_or((80, 24));
    let presentation = TerminalPlot {
        plot: AsciiPlot::new(width.saturating_sub(1) as usize, height.saturating_sub(14).max(5) as usize),
        dirty: true,
    };

    let mut app = ToneApp::new(player, Arc::new(MonotonicClock), presentation, &config);
    let initial = if config.melody {
        let info = melody_info();
        log::info!("{}: {} notes, {:.1} s at {}", info.name, info.note_count, info.duration, info.tempo);
        app.generate_melody()
    } else {
        app.generate()
    };
    if let Err(err) = initial {
        log::warn!("Initial generation failed: {}", err);
    }

    execute!(io::stdout(), Clear(ClearType::All), cursor::Hide)?;
    enable_raw_mode()?;

    let mut needs_redraw = true;
    let result: anyhow::Result<()> = loop {
        if app.pump() {
            needs_redraw = true;
        }
        if app.presentation().dirty {
            needs_redraw = true;
        }

        if needs_redraw {
            if let Err(err) = render_display(&app) {
                break Err(err.into());
            }
            app.presentation_mut().dirty = false;
            needs_redraw = false;
        }

        let ready = match event::poll(app.poll_interval()) {
            Ok(ready) => ready,
            Err(err) => break Err(err.into()),
        };
        if !ready {
            continue;
        }

        let key = match event::read() {
            Ok(Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. })) => code,
            Ok(_) => continue,
            Err(err) => break Err(err.into()),
        };

        match key {
            KeyCode::Char(' ') => app.toggle_play_pause(),
            KeyCode::Char('s') => app.stop(),
            KeyCode::Char('g') => {
                let _ = app.generate();
            }
            KeyCode::Char('m') => {
                let _ = app.generate_melody();
            }
            KeyCode::Char('w') => {
                let settings = app.settings_mut();
                settings.waveform = settings.waveform.cycle();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                app.settings_mut().frequency += FREQUENCY_STEP;
            }
            KeyCode::Char('-') => {
                let settings = app.settings_mut();
                settings.frequency = (settings.frequency - FREQUENCY_STEP).max(FREQUENCY_STEP);
            }
            KeyCode::Char('q') | KeyCode::Esc => break Ok(()),
            _ => continue,
        }
        needs_redraw = true;
    };

    app.stop();
    disable_raw_mode()?;
    execute!(io::stdout(), cursor::Show)?;
    println!();

    result
}
