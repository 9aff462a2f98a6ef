use std::time::Duration;

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info, warn};

use crate::audio_api::{AudioBackend, AudioCommand, TriggerParams, VoiceSource};
use crate::theory::Pitch;

mod engine;
mod frame;
mod sample_buffer;
mod voice;

pub use frame::StereoFrame;
pub use sample_buffer::SampleBuffer;

use engine::Engine;

const TRIGGER_GAIN: f32 = 0.8;

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    sample_rate: u32,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    pub fn send(&self, cmd: AudioCommand) {
        if self.tx.try_send(cmd).is_err() {
            warn!("audio command queue full; dropping command");
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl AudioBackend for AudioHandle {
    fn set_voice(&mut self, source: VoiceSource) {
        info!(voice = source.label(), "switching voice");
        self.send(AudioCommand::SetVoice(source));
    }

    fn trigger(&mut self, pitches: &[Pitch], duration: Duration) {
        self.send(AudioCommand::Trigger(TriggerParams {
            pitches: pitches.to_vec(),
            duration,
            gain: TRIGGER_GAIN,
        }));
    }

    fn release_all(&mut self) {
        self.send(AudioCommand::ReleaseAll);
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let output_stream =
                build_output_stream_f32(&device, &config.into(), rx, sample_rate, channels)?;
            output_stream.play().context("failed to play output stream")?;
            info!(sample_rate, channels, "audio output started");

            Ok(AudioHandle {
                tx,
                sample_rate,
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    sample_rate: u32,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(sample_rate);
    let mut scratch: Vec<StereoFrame> = vec![StereoFrame::zero(); 4096];

    let err_fn = |err| error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels.max(1);
            if channels == 2 {
                // SAFETY: StereoFrame is repr(C) with two f32 fields, so an
                // interleaved stereo buffer has exactly that layout
                let frames: &mut [StereoFrame] = unsafe {
                    std::slice::from_raw_parts_mut(data.as_mut_ptr() as *mut StereoFrame, n_frames)
                };
                engine.render_block(frames);
                return;
            }

            if scratch.len() < n_frames {
                scratch.resize(n_frames, StereoFrame::zero());
            }
            let frames = &mut scratch[..n_frames];
            engine.render_block(frames);
            for (out, frame) in data.chunks_exact_mut(channels.max(1)).zip(frames.iter()) {
                if let [l, r, rest @ ..] = out {
                    *l = frame.left;
                    *r = frame.right;
                    rest.fill(0.0);
                } else if let [m] = out {
                    *m = 0.5 * (frame.left + frame.right);
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
