mod audio;
mod audio_api;
mod config;
mod error;
mod loader;
mod middle;
mod sequencing;
mod shared;
mod speech;
mod theory;
mod tui;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use audio_api::{AudioBackend, NullBackend};
use config::{persistence, AppConfig};
use loader::{FsFetcher, InstrumentLoader, SampleCatalog, StatusBoard};
use middle::Middle;
use sequencing::{Player, Session, SystemClock, ToneKind, VocalPatternSpec, VOCAL_PRESETS};
use speech::{CommandSpeaker, SilentSpeaker, Speaker};

const FALLBACK_SAMPLE_RATE: u32 = 44100;
const DEFAULT_CHORDS: [&str; 7] = ["C", "Dm", "Em", "F", "G", "Am", "G7"];

#[derive(Parser)]
#[command(name = "solfa", version, about = "Ear training and vocal warm-ups in the terminal")]
struct Cli {
    /// Config file (default: ./.solfa/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding <instrument>/<note>.wav samples
    #[arg(long)]
    samples: Option<PathBuf>,

    /// Run without opening an audio device
    #[arg(long)]
    no_audio: bool,

    /// Never speak answers, even if the session asks for it
    #[arg(long)]
    no_speech: bool,

    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hear a note or chord, guess, get the answer
    Train {
        /// Treat targets as chord symbols
        #[arg(long)]
        chords: bool,
        #[arg(long)]
        instrument: Option<String>,
        /// Targets, comma separated (C4,E4,G4 or C,Am,F)
        #[arg(long, value_delimiter = ',')]
        targets: Vec<String>,
        /// Number of passes through the targets; 0 repeats forever
        #[arg(long)]
        loops: Option<u32>,
        /// Play targets in order instead of at random
        #[arg(long)]
        sequential: bool,
        /// Play a reference note before each target
        #[arg(long)]
        reference: Option<String>,
    },
    /// Sing a warm-up pattern up the range
    Vocal {
        #[arg(value_parser = clap::builder::PossibleValuesParser::new(VOCAL_PRESETS))]
        preset: String,
        #[arg(long)]
        instrument: Option<String>,
        #[arg(long)]
        loops: Option<u32>,
    },
    /// List the instruments in the sample catalog
    Instruments,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let project_dir = std::env::current_dir().context("no current directory")?;

    if let Command::Instruments = cli.command {
        let catalog = SampleCatalog::builtin();
        for name in catalog.names() {
            let count = catalog.get(name).map_or(0, |d| d.len());
            println!("{name:<20} {count} samples");
        }
        return Ok(());
    }

    init_logging(&project_dir)?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| persistence::config_path(&project_dir));
    let mut config = persistence::load_config(&config_path);
    if let Some(samples) = &cli.samples {
        config.samples_dir = samples.clone();
    }

    let (session, title) = build_session(&cli.command, &config)?;

    let (audio, sample_rate): (Box<dyn AudioBackend>, u32) = if cli.no_audio {
        (Box::new(NullBackend), FALLBACK_SAMPLE_RATE)
    } else {
        match audio::start_audio() {
            Ok(handle) => {
                let rate = handle.sample_rate();
                (Box::new(handle), rate)
            }
            Err(e) => {
                warn!(error = %e, "no audio output; continuing silently");
                (Box::new(NullBackend), FALLBACK_SAMPLE_RATE)
            }
        }
    };

    let speaker: Box<dyn Speaker> = match (cli.no_speech, CommandSpeaker::detect()) {
        (false, Some(speaker)) => Box::new(speaker),
        _ => Box::new(SilentSpeaker),
    };

    let board = StatusBoard::new();
    let loader = InstrumentLoader::new(
        SampleCatalog::builtin(),
        Arc::new(FsFetcher::new(config.samples_dir.clone(), sample_rate)),
        board.clone(),
    );
    for name in &config.preload {
        loader.preload(name);
    }

    let mut player = Player::new(audio, speaker, Arc::new(SystemClock::new()), Some(loader));
    if let Some(seed) = cli.seed {
        player = player.with_seed(seed);
    }
    let mut middle = Middle::new(player, &board, session, title);

    run_tui(&mut middle)?;

    if let Err(e) = persistence::save_config(&config_path, &config) {
        warn!(error = %e, "could not save config");
    }
    info!("bye");
    Ok(())
}

fn build_session(command: &Command, config: &AppConfig) -> anyhow::Result<(Session, String)> {
    match command {
        Command::Train {
            chords,
            instrument,
            targets,
            loops,
            sequential,
            reference,
        } => {
            let mut spec = config.training.clone();
            if *chords {
                spec.tone_kind = ToneKind::Chords;
                if targets.is_empty() {
                    spec.symbols = DEFAULT_CHORDS.iter().map(|s| s.to_string()).collect();
                }
            }
            if !targets.is_empty() {
                spec.symbols = targets.clone();
            }
            if let Some(instrument) = instrument {
                spec.instrument = instrument.clone();
            }
            if let Some(loops) = loops {
                spec.loop_count = *loops;
            }
            if *sequential {
                spec.random = false;
            }
            if let Some(reference) = reference {
                spec.reference.enabled = true;
                spec.reference.symbol = reference.clone();
            }
            let title = if spec.tone_kind == ToneKind::Chords {
                "chord training"
            } else {
                "note training"
            };
            Ok((Session::Training(spec), title.to_string()))
        }
        Command::Vocal {
            preset,
            instrument,
            loops,
        } => {
            let mut spec = VocalPatternSpec::preset(preset)
                .with_context(|| format!("unknown vocal exercise {preset}"))?;
            if let Some(instrument) = instrument.as_ref().or(config.vocal_instrument.as_ref()) {
                spec.instrument = instrument.clone();
            }
            if let Some(loops) = loops {
                spec.loop_count = *loops;
            }
            let title = format!("vocal: {}", spec.name);
            Ok((Session::Vocal(spec), title))
        }
        Command::Instruments => anyhow::bail!("instruments has no session"),
    }
}

// The TUI owns the terminal, so logs go to <project>/.solfa/solfa.log
fn init_logging(project_dir: &Path) -> anyhow::Result<()> {
    let dir = persistence::state_dir(project_dir);
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(persistence::LOG_FILE))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn run_tui(middle: &mut Middle) -> anyhow::Result<()> {
    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // restores the terminal on any exit path
    crossterm::execute!(std::io::stdout(), terminal::EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(16); // ~60fps
    let mut tui_state = tui::mode::TuiState::default();
    middle.start();

    loop {
        let ds = middle.display_state().clone();
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, &tui_state);
        })?;

        for event in tui::input::poll_input(tick_rate, &mut tui_state)? {
            if !middle.handle_input(event) {
                return Ok(());
            }
        }
        middle.tick();
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(std::io::stdout(), terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
