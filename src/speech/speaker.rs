use std::process::{Child, Command, Stdio};

use tracing::{debug, info};

use crate::error::SpeechError;

const BASE_WORDS_PER_MINUTE: f32 = 175.0;
const PROGRAMS: [&str; 3] = ["espeak-ng", "espeak", "say"];

/// Text-to-speech primitive. Fire-and-forget: returning `Ok` means the
/// utterance was handed off, not that it finished.
pub trait Speaker {
    fn speak(&mut self, text: &str, rate: f32) -> Result<(), SpeechError>;
}

// Shells out to the first speech program found on PATH.
pub struct CommandSpeaker {
    program: String,
    running: Vec<Child>,
}

impl CommandSpeaker {
    pub fn detect() -> Option<Self> {
        let path = std::env::var_os("PATH")?;
        let program = PROGRAMS.iter().find(|name| {
            std::env::split_paths(&path).any(|dir| dir.join(name).is_file())
        })?;
        info!(program, "speech enabled");
        Some(Self::with_program(program))
    }

    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
            running: Vec::new(),
        }
    }

    fn command(&self, text: &str, rate: f32) -> Command {
        let wpm = ((BASE_WORDS_PER_MINUTE * rate).round() as u32).max(1).to_string();
        let mut cmd = Command::new(&self.program);
        match self.program.as_str() {
            "say" => cmd.args(["-r", wpm.as_str(), text]),
            _ => cmd.args(["-s", wpm.as_str(), text]),
        };
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
        cmd
    }

    // reap finished utterances so they don't linger as zombies
    fn reap(&mut self) {
        self.running.retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&mut self, text: &str, rate: f32) -> Result<(), SpeechError> {
        self.reap();
        debug!(text, rate, "speak");
        let child = self.command(text, rate).spawn()?;
        self.running.push(child);
        Ok(())
    }
}

impl Drop for CommandSpeaker {
    fn drop(&mut self) {
        for child in &mut self.running {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

// Used when no speech program exists or speech is switched off.
#[derive(Debug, Default)]
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker {
    fn speak(&mut self, _text: &str, _rate: f32) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn rate_scales_words_per_minute() {
        let speaker = CommandSpeaker::with_program("espeak-ng");
        assert_eq!(args(&speaker.command("C 4", 0.5)), ["-s", "88", "C 4"]);
        let speaker = CommandSpeaker::with_program("say");
        assert_eq!(args(&speaker.command("Do", 1.0)), ["-r", "175", "Do"]);
    }

    #[test]
    fn missing_program_is_an_error_not_a_panic() {
        let mut speaker = CommandSpeaker::with_program("definitely-not-a-speech-program");
        assert!(matches!(speaker.speak("hi", 1.0), Err(SpeechError::Failed(_))));
    }

    #[test]
    fn silent_speaker_is_unavailable() {
        assert!(matches!(SilentSpeaker.speak("hi", 1.0), Err(SpeechError::Unavailable)));
    }
}
