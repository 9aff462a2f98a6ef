use crate::audio_api::{AudioCommand, TriggerParams, VoiceSource};
use crate::theory::Pitch;

use super::frame::StereoFrame;
use super::voice::Voice;

const MAX_VOICES: usize = 32; // pool is preallocated so the callback never grows it

// Runs inside the output callback. Everything here is bounded work over the
// fixed voice pool.
pub struct Engine {
    sample_rate: f32,
    source: VoiceSource,
    voices: Vec<Voice>,
}

impl Engine {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            source: VoiceSource::Synth,
            voices: Vec::with_capacity(MAX_VOICES),
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            // the loader cache keeps its own Arc, so replacing this one never
            // frees sample data on the audio thread
            AudioCommand::SetVoice(source) => self.source = source,
            AudioCommand::Trigger(t) => self.trigger(t),
            AudioCommand::ReleaseAll => {
                for v in &mut self.voices {
                    v.stop(self.sample_rate);
                }
            }
        }
    }

    fn trigger(&mut self, t: TriggerParams) {
        let hold_frames = (t.duration.as_secs_f32() * self.sample_rate) as usize;
        for pitch in t.pitches {
            let voice = self.make_voice(pitch, t.gain, hold_frames);
            if self.voices.len() == MAX_VOICES {
                // steal the oldest
                self.voices.remove(0);
            }
            self.voices.push(voice);
        }
    }

    fn make_voice(&self, pitch: Pitch, gain: f32, hold_frames: usize) -> Voice {
        if let VoiceSource::Sampled(instrument) = &self.source {
            if let Some((sampled_at, buffer)) = instrument.nearest(pitch) {
                let semitones = pitch.0 as i32 - sampled_at.0 as i32;
                return Voice::sampled(buffer.clone(), semitones, gain, hold_frames, self.sample_rate);
            }
        }
        Voice::sine(pitch.frequency(), gain * 0.25, hold_frames, self.sample_rate)
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        out.fill(StereoFrame::zero());
        for v in &mut self.voices {
            v.render_into(out);
        }
        self.voices.retain(|v| v.active);
    }
}
