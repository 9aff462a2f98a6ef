// The playback state machine.
//
// Idle -> Preparing -> CountingDown -> Running <-> Paused -> Completed
//                                                         \-> Cancelled
//
// Everything is driven from `tick()` against the injected clock. Each step
// is planned up front as a list of timed cues; a cue fires on the first tick
// at or after its offset. The next step begins exactly one period after the
// current one began. After a stall longer than a period, the missed steps
// are dropped and the grid picks up at the boundary that owns the present.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::audio_api::{AudioBackend, VoiceSource};
use crate::error::SessionError;
use crate::loader::{InstrumentLoader, PendingLoad};
use crate::speech::{self, Speaker};

use super::clock::Clock;
use super::plan::{Cue, StepPlan, StepSource};
use super::spec::{PlaybackSpec, VocalPatternSpec};
use super::training::TrainingProgram;
use super::vocal::VocalProgram;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayerState {
    #[default]
    Idle,
    Preparing,
    CountingDown,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl PlayerState {
    pub fn is_active(self) -> bool {
        matches!(
            self,
            PlayerState::Preparing
                | PlayerState::CountingDown
                | PlayerState::Running
                | PlayerState::Paused
        )
    }
}

// What to play.
#[derive(Clone, Debug)]
pub enum Session {
    Training(PlaybackSpec),
    Vocal(VocalPatternSpec),
}

impl Session {
    pub fn instrument(&self) -> &str {
        match self {
            Session::Training(spec) => &spec.instrument,
            Session::Vocal(spec) => &spec.instrument,
        }
    }

    fn countdown(&self) -> Duration {
        match self {
            Session::Training(_) => Duration::ZERO,
            Session::Vocal(spec) => spec.countdown,
        }
    }

    fn speech_rate(&self) -> Option<f32> {
        match self {
            Session::Training(spec) if spec.speech.enabled => {
                Some(speech::speaking_rate(spec.speech.slowness))
            }
            _ => None,
        }
    }

    fn steps(self, rng: fastrand::Rng) -> Result<Box<dyn StepSource>, SessionError> {
        Ok(match self {
            Session::Training(spec) => Box::new(TrainingProgram::new(spec, rng)?),
            Session::Vocal(spec) => Box::new(VocalProgram::new(spec, rng)?),
        })
    }
}

// Everything a front-end needs to draw the session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionView {
    pub label: String,
    pub revealed: bool,
    pub steps_played: usize,
    pub cycle: u32,
    pub phrase_step: usize,
    pub phrase_steps: usize,
    pub phrase_notes: Vec<String>,
    pub active_note: Option<i32>,
    pub tip: Option<String>,
    pub countdown: Option<u64>,
    pub voice: String,
}

struct CurrentStep {
    started: Duration,
    plan: StepPlan,
    next_cue: usize,
}

enum Phase {
    CountingDown { ends: Duration },
    Running(Option<CurrentStep>),
    // countdown remaining when paused mid-countdown
    Paused { countdown_left: Option<Duration> },
}

struct ActiveSession {
    steps: Box<dyn StepSource>,
    phase: Phase,
    speech_rate: Option<f32>,
    speech_warned: bool,
    pending_voice: Option<PendingLoad>,
}

pub struct Player {
    audio: Box<dyn AudioBackend>,
    speaker: Box<dyn Speaker>,
    clock: Arc<dyn Clock>,
    loader: Option<InstrumentLoader>,
    rng: fastrand::Rng,
    state: PlayerState,
    session: Option<ActiveSession>,
    view: SessionView,
}

impl Player {
    pub fn new(
        audio: Box<dyn AudioBackend>,
        speaker: Box<dyn Speaker>,
        clock: Arc<dyn Clock>,
        loader: Option<InstrumentLoader>,
    ) -> Self {
        Self {
            audio,
            speaker,
            clock,
            loader,
            rng: fastrand::Rng::new(),
            state: PlayerState::Idle,
            session: None,
            view: SessionView::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn view(&self) -> &SessionView {
        &self.view
    }

    // Validate and begin a session. Any session already playing is silenced
    // and dropped first. Never blocks on instrument loading.
    pub fn start(&mut self, session: Session) -> Result<(), SessionError> {
        let instrument = session.instrument().to_string();
        let countdown = session.countdown();
        let speech_rate = session.speech_rate();
        let steps = session.steps(fastrand::Rng::with_seed(self.rng.u64(..)))?;

        if self.state.is_active() {
            self.audio.release_all();
        }
        self.view = SessionView::default();
        self.state = PlayerState::Preparing;
        info!(instrument = %instrument, "session starting");

        let pending_voice = self.select_voice(&instrument);
        let now = self.clock.now();
        let phase = if countdown.is_zero() {
            Phase::Running(None)
        } else {
            Phase::CountingDown {
                ends: now + countdown,
            }
        };
        self.session = Some(ActiveSession {
            steps,
            phase,
            speech_rate,
            speech_warned: false,
            pending_voice,
        });

        if countdown.is_zero() {
            self.state = PlayerState::Running;
            self.begin_step(now);
        } else {
            self.state = PlayerState::CountingDown;
        }
        self.tick();
        Ok(())
    }

    // Sampled voice if it's ready, synth otherwise; returns the load to poll.
    fn select_voice(&mut self, instrument: &str) -> Option<PendingLoad> {
        let pending = match self.loader.as_ref().map(|l| l.load(instrument)) {
            Some(Ok(pending)) => pending,
            Some(Err(e)) => {
                warn!(instrument, error = %e, "instrument unavailable; using synth voice");
                self.use_voice(VoiceSource::Synth);
                return None;
            }
            None => {
                self.use_voice(VoiceSource::Synth);
                return None;
            }
        };
        match pending.try_result() {
            Some(Ok(sampled)) => {
                self.use_voice(VoiceSource::Sampled(sampled));
                None
            }
            Some(Err(e)) => {
                warn!(instrument, error = %e, "instrument failed to load; using synth voice");
                self.use_voice(VoiceSource::Synth);
                None
            }
            None => {
                debug!(instrument, "instrument still loading; starting on synth voice");
                self.use_voice(VoiceSource::Synth);
                Some(pending)
            }
        }
    }

    fn use_voice(&mut self, source: VoiceSource) {
        self.view.voice = source.label().to_string();
        self.audio.set_voice(source);
    }

    fn poll_voice(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(result) = session.pending_voice.as_ref().and_then(|p| p.try_result()) else {
            return;
        };
        session.pending_voice = None;
        match result {
            Ok(sampled) => {
                info!(instrument = %sampled.name, "instrument ready; switching voice");
                self.use_voice(VoiceSource::Sampled(sampled));
            }
            Err(e) => warn!(error = %e, "instrument failed to load; staying on synth voice"),
        }
    }

    pub fn pause(&mut self) {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let countdown_left = match session.phase {
            Phase::Running(_) => None,
            Phase::CountingDown { ends } => Some(ends.saturating_sub(now)),
            Phase::Paused { .. } => return,
        };
        session.phase = Phase::Paused { countdown_left };
        self.audio.release_all();
        self.view.active_note = None;
        self.state = PlayerState::Paused;
        debug!("paused");
    }

    // Pick up with a fresh step at the current instant (or the rest of the
    // countdown). The interrupted step is not replayed.
    pub fn resume(&mut self) {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Phase::Paused { countdown_left } = session.phase else {
            return;
        };
        match countdown_left {
            Some(left) => {
                session.phase = Phase::CountingDown { ends: now + left };
                self.state = PlayerState::CountingDown;
            }
            None => {
                session.phase = Phase::Running(None);
                self.state = PlayerState::Running;
                self.begin_step(now);
            }
        }
        debug!("resumed");
        self.tick();
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            PlayerState::Running | PlayerState::CountingDown => self.pause(),
            PlayerState::Paused => self.resume(),
            _ => {}
        }
    }

    pub fn cancel(&mut self) {
        if !self.state.is_active() {
            return;
        }
        self.audio.release_all();
        self.session = None;
        self.view.active_note = None;
        self.view.countdown = None;
        self.state = PlayerState::Cancelled;
        info!("session cancelled");
    }

    // Fire whatever is due. Call often; nothing happens between calls.
    pub fn tick(&mut self) {
        self.poll_voice();
        let now = self.clock.now();

        let countdown_end = match self.session.as_ref().map(|s| &s.phase) {
            Some(Phase::CountingDown { ends }) => Some(*ends),
            _ => None,
        };
        if let Some(ends) = countdown_end {
            if now < ends {
                let left = ends - now;
                self.view.countdown = Some(left.as_millis().div_ceil(1000) as u64);
                return;
            }
            self.view.countdown = None;
            if let Some(session) = self.session.as_mut() {
                session.phase = Phase::Running(None);
            }
            self.state = PlayerState::Running;
            self.begin_step(ends);
        }

        loop {
            let Some(ActiveSession {
                phase: Phase::Running(Some(step)),
                ..
            }) = self.session.as_mut()
            else {
                return;
            };

            let period = step.plan.period;
            let next_start = step.started + period;
            if now >= next_start + period {
                // stalled for more than a whole slot: the missed steps stay
                // silent and the grid resumes at the boundary that owns now
                let behind = ((now - step.started).as_nanos() / period.as_nanos().max(1)) as u32;
                let resume_at = step.started + period * behind;
                debug!(skipped = behind - 1, "ticks fell behind; skipping missed steps");
                self.begin_step(resume_at);
                continue;
            }

            let mut due = Vec::new();
            while let Some(cue) = step.plan.cues.get(step.next_cue) {
                if step.started + cue.at > now {
                    break;
                }
                due.push(cue.cue.clone());
                step.next_cue += 1;
            }

            for cue in due {
                self.fire(cue);
            }
            if now < next_start {
                return;
            }
            self.begin_step(next_start);
        }
    }

    fn begin_step(&mut self, at: Duration) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.steps.next_step() {
            Some(plan) => {
                session.phase = Phase::Running(Some(CurrentStep {
                    started: at,
                    plan,
                    next_cue: 0,
                }));
                self.view.steps_played += 1;
                self.view.revealed = false;
            }
            None => {
                self.session = None;
                self.view.active_note = None;
                self.state = PlayerState::Completed;
                info!(steps = self.view.steps_played, "session completed");
            }
        }
    }

    fn fire(&mut self, cue: Cue) {
        match cue {
            Cue::Trigger { pitches, duration } => self.audio.trigger(&pitches, duration),
            Cue::Speak(text) => self.say(&text),
            Cue::SetLabel(label) => {
                self.view.label = label;
                self.view.revealed = false;
            }
            Cue::Reveal => self.view.revealed = true,
            Cue::AppendLabel(extra) => {
                self.view.label.push(' ');
                self.view.label.push_str(&extra);
            }
            Cue::SetPhrase {
                cycle,
                step,
                steps,
                notes,
                tip,
            } => {
                self.view.cycle = cycle;
                self.view.phrase_step = step;
                self.view.phrase_steps = steps;
                self.view.phrase_notes = notes;
                if tip.is_some() {
                    self.view.tip = tip;
                }
            }
            Cue::ActiveNote(i) => self.view.active_note = Some(i),
        }
    }

    fn say(&mut self, text: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(rate) = session.speech_rate else {
            return;
        };
        let spoken = speech::render(text);
        if let Err(e) = self.speaker.speak(&spoken, rate) {
            // keep going silently; one warning per session is enough
            if !session.speech_warned {
                warn!(error = %e, "speech failed; continuing without it");
                session.speech_warned = true;
            } else {
                debug!(error = %e, "speech failed");
            }
        }
    }
}
