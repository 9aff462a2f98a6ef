use std::sync::Arc;

use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;

const ATTACK_SECS: f32 = 0.005;
const RELEASE_SECS: f32 = 0.12;
const STOP_SECS: f32 = 0.01;

#[derive(Clone, Debug)]
enum Oscillator {
    Sine { phase: f32, phase_inc: f32 },
    // pos advances by `rate` per output frame; rate = 2^(semitones/12)
    Sample { buffer: Arc<SampleBuffer>, pos: f32, rate: f32 },
}

impl Oscillator {
    #[inline]
    fn next(&mut self) -> Option<StereoFrame> {
        match self {
            Oscillator::Sine { phase, phase_inc } => {
                let s = phase.sin();
                *phase += *phase_inc;
                if *phase > std::f32::consts::TAU {
                    *phase -= std::f32::consts::TAU;
                }
                Some(StereoFrame::mono(s))
            }
            Oscillator::Sample { buffer, pos, rate } => {
                if *pos >= buffer.len() as f32 {
                    return None;
                }
                let frame = buffer.read(*pos);
                *pos += *rate;
                Some(frame)
            }
        }
    }
}

// One sounding pitch: an oscillator under an attack / hold / release envelope.
#[derive(Clone, Debug)]
pub struct Voice {
    osc: Oscillator,
    gain: f32,
    env: f32,
    attack_step: f32,
    release_step: f32,
    hold_frames: usize,
    releasing: bool,
    pub active: bool,
}

impl Voice {
    fn with_osc(osc: Oscillator, gain: f32, hold_frames: usize, sample_rate: f32) -> Self {
        Self {
            osc,
            gain,
            env: 0.0,
            attack_step: 1.0 / (ATTACK_SECS * sample_rate).max(1.0),
            release_step: 1.0 / (RELEASE_SECS * sample_rate).max(1.0),
            hold_frames,
            releasing: false,
            active: true,
        }
    }

    pub fn sine(freq: f32, gain: f32, hold_frames: usize, sample_rate: f32) -> Self {
        let phase_inc = std::f32::consts::TAU * freq / sample_rate;
        Self::with_osc(Oscillator::Sine { phase: 0.0, phase_inc }, gain, hold_frames, sample_rate)
    }

    pub fn sampled(
        buffer: Arc<SampleBuffer>,
        semitones: i32,
        gain: f32,
        hold_frames: usize,
        sample_rate: f32,
    ) -> Self {
        let rate = 2.0_f32.powf(semitones as f32 / 12.0);
        Self::with_osc(Oscillator::Sample { buffer, pos: 0.0, rate }, gain, hold_frames, sample_rate)
    }

    pub fn playback_rate(&self) -> f32 {
        match self.osc {
            Oscillator::Sine { .. } => 1.0,
            Oscillator::Sample { rate, .. } => rate,
        }
    }

    // Fade out quickly from wherever the envelope is.
    pub fn stop(&mut self, sample_rate: f32) {
        self.releasing = true;
        self.release_step = self.release_step.max(1.0 / (STOP_SECS * sample_rate).max(1.0));
    }

    pub fn render_into(&mut self, out: &mut [StereoFrame]) {
        for frame in out.iter_mut() {
            if !self.active {
                break;
            }
            let Some(sample) = self.osc.next() else {
                self.active = false;
                break;
            };

            if self.releasing {
                self.env -= self.release_step;
                if self.env <= 0.0 {
                    self.active = false;
                    break;
                }
            } else {
                self.env = (self.env + self.attack_step).min(1.0);
                if self.hold_frames == 0 {
                    self.releasing = true;
                } else {
                    self.hold_frames -= 1;
                }
            }

            let g = self.env * self.gain;
            frame.left += sample.left * g;
            frame.right += sample.right * g;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 1000.0;

    fn render(voice: &mut Voice, frames: usize) -> Vec<StereoFrame> {
        let mut out = vec![StereoFrame::zero(); frames];
        voice.render_into(&mut out);
        out
    }

    #[test]
    fn sine_holds_then_releases() {
        let mut v = Voice::sine(50.0, 0.5, 100, SR);
        let out = render(&mut v, 100);
        assert!(out.iter().any(|f| f.peak() > 0.1));
        assert!(v.active);
        // release is 120 frames at this rate
        render(&mut v, 200);
        assert!(!v.active);
    }

    #[test]
    fn sampled_voice_ends_with_its_buffer() {
        let buffer = Arc::new(SampleBuffer {
            data: vec![StereoFrame::mono(1.0); 10],
        });
        let mut v = Voice::sampled(buffer, 12, 1.0, 1000, SR);
        assert_eq!(v.playback_rate(), 2.0);
        // an octave up reads the 10 frames in 5
        let out = render(&mut v, 8);
        assert!(!v.active);
        assert_eq!(out[6], StereoFrame::zero());
    }

    #[test]
    fn stop_fades_fast() {
        let mut v = Voice::sine(50.0, 0.5, 10_000, SR);
        render(&mut v, 50);
        v.stop(SR);
        render(&mut v, 11);
        assert!(!v.active);
    }
}
