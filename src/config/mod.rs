pub mod persistence;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::sequencing::PlaybackSpec;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub samples_dir: PathBuf,
    // instruments fetched in the background at startup
    pub preload: Vec<String>,
    pub training: PlaybackSpec,
    pub vocal_instrument: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            samples_dir: PathBuf::from("samples"),
            preload: vec!["piano".into()],
            training: PlaybackSpec::default(),
            vocal_instrument: None,
        }
    }
}
