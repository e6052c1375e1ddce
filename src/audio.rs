//! Synthesized sound effects. No assets: every effect is a fundsp graph, an
//! oscillator times an exponential fade envelope, streamed into rodio.

use std::time::Duration;

use fundsp::prelude32::*;
use rodio::{ChannelCount, OutputStream, OutputStreamBuilder, SampleRate, Sink, Source};

use crate::sim::SoundEvent;

pub const SAMPLE_RATE: u32 = 44_100;

/// Level the fade ends on. An exponential ramp can't reach zero.
const FADE_FLOOR: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Square,
    Sine,
    Saw,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub wave: Wave,
    pub freq: f32,
    /// Seconds.
    pub duration: f32,
    pub volume: f32,
}

impl Tone {
    pub fn for_event(event: SoundEvent) -> Self {
        match event {
            SoundEvent::Jump => Tone {
                wave: Wave::Square,
                freq: 400.0,
                duration: 0.1,
                volume: 0.1,
            },
            SoundEvent::Score => Tone {
                wave: Wave::Sine,
                freq: 1000.0,
                duration: 0.1,
                volume: 0.1,
            },
            SoundEvent::Crash => Tone {
                wave: Wave::Saw,
                freq: 100.0,
                duration: 0.3,
                volume: 0.2,
            },
        }
    }

    /// Gain at `t` seconds: `volume` at 0, falling exponentially to
    /// [`FADE_FLOOR`] at `duration`. Drives the envelope in [`Tone::voice`].
    pub fn gain_at(&self, t: f32) -> f32 {
        let progress = (t / self.duration).clamp(0.0, 1.0);
        self.volume * (FADE_FLOOR / self.volume).powf(progress)
    }

    pub fn sample_count(&self) -> usize {
        (SAMPLE_RATE as f32 * self.duration) as usize
    }

    /// The effect as a fundsp graph: oscillator * fade.
    pub fn voice(&self) -> Box<dyn AudioUnit> {
        let tone = *self;
        let fade = lfo(move |t| tone.gain_at(t));
        let mut voice: Box<dyn AudioUnit> = match self.wave {
            Wave::Square => Box::new(square_hz(self.freq) * fade),
            Wave::Sine => Box::new(sine_hz(self.freq) * fade),
            Wave::Saw => Box::new(saw_hz(self.freq) * fade),
        };
        voice.set_sample_rate(SAMPLE_RATE as f64);
        voice
    }

    /// Streams the voice for `duration`. Samples are computed as rodio
    /// pulls them, on the audio thread.
    pub fn source(&self) -> ToneSource {
        ToneSource {
            voice: self.voice(),
            remaining: self.sample_count(),
            duration: Duration::from_secs_f32(self.duration),
        }
    }
}

/// A mono rodio source that pulls from a fundsp graph sample by sample.
pub struct ToneSource {
    voice: Box<dyn AudioUnit>,
    remaining: usize,
    duration: Duration,
}

impl Iterator for ToneSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.voice.get_mono())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl Source for ToneSource {
    fn current_span_len(&self) -> Option<usize> {
        Some(self.remaining)
    }

    fn channels(&self) -> ChannelCount {
        1
    }

    fn sample_rate(&self) -> SampleRate {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.duration)
    }
}

/// Plays effects on the default output device, or nothing at all when
/// there isn't one (or when muted).
pub struct Audio {
    stream: Option<OutputStream>,
}

impl Audio {
    pub fn open() -> Self {
        match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                stream.log_on_drop(false);
                Self {
                    stream: Some(stream),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "no audio device, running silent");
                Self::muted()
            }
        }
    }

    pub fn muted() -> Self {
        Self { stream: None }
    }

    pub fn is_muted(&self) -> bool {
        self.stream.is_none()
    }

    /// Starts the effect and returns right away.
    pub fn play(&self, event: SoundEvent) {
        let Some(stream) = &self.stream else {
            return;
        };
        let sink = Sink::connect_new(stream.mixer());
        sink.append(Tone::for_event(event).source());
        sink.detach(); // Play in background
    }
}
