use std::sync::Arc;
use std::time::Duration;

use crate::loader::SampledInstrument;
use crate::theory::Pitch;

// What the engine plays triggered pitches with.
#[derive(Clone, Debug, Default)]
pub enum VoiceSource {
    #[default]
    Synth,
    Sampled(Arc<SampledInstrument>),
}

impl VoiceSource {
    pub fn label(&self) -> &str {
        match self {
            VoiceSource::Synth => "synth",
            VoiceSource::Sampled(instrument) => &instrument.name,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TriggerParams {
    pub pitches: Vec<Pitch>, // struck together
    pub duration: Duration,
    pub gain: f32,
}

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // Instruments are decoded off the audio thread by the loader; the engine
    // only ever receives finished buffers.
    SetVoice(VoiceSource),
    Trigger(TriggerParams),
    ReleaseAll,
}

/// Sink for the scheduler's sound cues.
pub trait AudioBackend {
    fn set_voice(&mut self, source: VoiceSource);
    fn trigger(&mut self, pitches: &[Pitch], duration: Duration);
    fn release_all(&mut self);
}

// --no-audio, or no output device
#[derive(Debug, Default)]
pub struct NullBackend;

impl AudioBackend for NullBackend {
    fn set_voice(&mut self, _source: VoiceSource) {}
    fn trigger(&mut self, _pitches: &[Pitch], _duration: Duration) {}
    fn release_all(&mut self) {}
}
