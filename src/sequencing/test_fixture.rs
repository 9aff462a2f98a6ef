// Recording stand-ins for the audio backend and speech, for driving the player
// in tests without a device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::audio_api::{AudioBackend, VoiceSource};
use crate::error::SpeechError;
use crate::speech::Speaker;
use crate::theory::Pitch;

use super::clock::{Clock, ManualClock};

#[derive(Clone, Debug, PartialEq)]
pub enum Recorded {
    Voice(String),
    Trigger {
        at: Duration,
        pitches: Vec<Pitch>,
        duration: Duration,
    },
    ReleaseAll,
}

#[derive(Clone)]
pub struct RecordingBackend {
    clock: ManualClock,
    events: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingBackend {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            events: Arc::default(),
        }
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    pub fn triggers(&self) -> Vec<(Duration, Vec<Pitch>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Trigger { at, pitches, .. } => Some((at, pitches)),
                _ => None,
            })
            .collect()
    }

    pub fn voices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Voice(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Recorded) {
        self.events.lock().unwrap().push(event);
    }
}

impl AudioBackend for RecordingBackend {
    fn set_voice(&mut self, source: VoiceSource) {
        self.push(Recorded::Voice(source.label().to_string()));
    }

    fn trigger(&mut self, pitches: &[Pitch], duration: Duration) {
        self.push(Recorded::Trigger {
            at: self.clock.now(),
            pitches: pitches.to_vec(),
            duration,
        });
    }

    fn release_all(&mut self) {
        self.push(Recorded::ReleaseAll);
    }
}

#[derive(Clone, Default)]
pub struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<(String, f32)>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<(String, f32)> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&mut self, text: &str, rate: f32) -> Result<(), SpeechError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SpeechError::Unavailable);
        }
        self.spoken.lock().unwrap().push((text.to_string(), rate));
        Ok(())
    }
}
