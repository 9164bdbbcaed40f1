//! Presentation boundary: what gets drawn and a text plot renderer

use crate::buffer::{to_pcm16, BufferKind, NoteSegment, WaveformBuffer};

/// Everything a renderer needs for one plot
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub time_axis: &'a [f64],
    pub samples: &'a [f32],
    pub title: &'a str,
    pub frequency: f64,
    pub sample_rate: u32,
}

/// Receives render requests from the UI layer
pub trait Presentation {
    fn render(&mut self, request: &RenderRequest<'_>);
}

fn rate_suffix(sample_rate: u32) -> String {
    format!("({:.1} kHz, 16-bit)", sample_rate as f64 / 1000.0)
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_frequency(frequency: f64) -> String {
    if frequency.fract() == 0.0 {
        format!("{:.0}", frequency)
    } else {
        format!("{}", frequency)
    }
}

/// Title for a whole buffer
pub fn buffer_title(buffer: &WaveformBuffer) -> String {
    match buffer.kind() {
        BufferKind::Tone { waveform, frequency } => format!(
            "{} Wave – {} Hz {}",
            capitalize(waveform.name()),
            format_frequency(*frequency),
            rate_suffix(buffer.sample_rate())
        ),
        BufferKind::Melody { name } => format!("{} {}", name, rate_suffix(buffer.sample_rate())),
    }
}

/// Title for one note of a melody
pub fn note_title(buffer: &WaveformBuffer, segment: &NoteSegment) -> String {
    let name = match buffer.kind() {
        BufferKind::Melody { name } => name.as_str(),
        BufferKind::Tone { .. } => "Note",
    };
    format!(
        "{} – {} {:.2} Hz {}",
        name,
        segment.label,
        segment.frequency,
        rate_suffix(buffer.sample_rate())
    )
}

/// Min/max column plot of 16-bit samples as lines of text
#[derive(Debug, Clone)]
pub struct AsciiPlot {
    width: usize,
    height: usize,
    title: String,
    lines: Vec<String>,
}

impl AsciiPlot {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(1),
            height: height.max(3),
            title: String::new(),
            lines: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn plot(&self, time_axis: &[f64], pcm: &[i16]) -> Vec<String> {
        let mut grid = vec![vec![' '; self.width]; self.height];
        let center = self.height / 2;
        for cell in grid[center].iter_mut() {
            *cell = '-';
        }

        let peak = pcm.iter().map(|s| (*s as i32).abs()).max().unwrap_or(0);
        let peak = if peak == 0 { i16::MAX as i32 } else { peak };
        let limit = peak as f64 * 1.1;

        let row_of = |value: i32| -> usize {
            let normalized = (value as f64 / limit + 1.0) / 2.0;
            let row = ((1.0 - normalized) * (self.height - 1) as f64).round() as isize;
            row.clamp(0, self.height as isize - 1) as usize
        };

        if !pcm.is_empty() {
            for column in 0..self.width {
                let start = column * pcm.len() / self.width;
                let end = ((column + 1) * pcm.len() / self.width).max(start + 1).min(pcm.len());
                if start >= end {
                    continue;
                }
                let chunk = &pcm[start..end];
                let low = chunk.iter().copied().min().unwrap_or(0) as i32;
                let high = chunk.iter().copied().max().unwrap_or(0) as i32;
                for row in row_of(high)..=row_of(low) {
                    grid[row][column] = '#';
                }
            }
        }

        let mut lines: Vec<String> = grid.into_iter().map(|row| row.into_iter().collect()).collect();
        if let (Some(first), Some(last)) = (time_axis.first(), time_axis.last()) {
            let left = format!("{:.3}s", first);
            let right = format!("{:.3}s", last);
            let gap = self.width.saturating_sub(left.len() + right.len()).max(1);
            lines.push(format!("{}{}{}", left, " ".repeat(gap), right));
        }
        lines
    }
}

impl Presentation for AsciiPlot {
    fn render(&mut self, request: &RenderRequest<'_>) {
        let pcm = to_pcm16(request.samples);
        self.title = request.title.to_string();
        self.lines = self.plot(request.time_axis, &pcm);
    }
}
