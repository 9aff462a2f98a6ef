// Read on startup, written on quit. A missing or broken file never stops the
// app: it falls back to defaults and says so in the log.
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};

use super::AppConfig;

pub const STATE_DIR: &str = ".solfa";
const CONFIG_FILE: &str = "config.json";
pub const LOG_FILE: &str = "solfa.log";

// <project_dir>/.solfa
pub fn state_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(STATE_DIR)
}

// <project_dir>/.solfa/config.json
pub fn config_path(project_dir: &Path) -> PathBuf {
    state_dir(project_dir).join(CONFIG_FILE)
}

pub fn load_config(path: &Path) -> AppConfig {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no config file; using defaults");
            return AppConfig::default();
        }
    };
    match serde_json::from_str(&data) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config file is invalid; using defaults");
            AppConfig::default()
        }
    }
}

// Creates .solfa/ if needed
pub fn save_config(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencing::ToneKind;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config(&config_path(dir.path())), AppConfig::default());
    }

    #[test]
    fn garbage_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path), AppConfig::default());
    }

    #[test]
    fn save_then_load_keeps_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_path(dir.path());
        let mut config = AppConfig::default();
        config.training.tone_kind = ToneKind::Chords;
        config.training.symbols = vec!["Am".into(), "F".into()];
        config.preload.clear();

        save_config(&path, &config).unwrap();
        assert!(state_dir(dir.path()).is_dir());
        assert_eq!(load_config(&path), config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, r#"{"training":{"loop_count":3}}"#).unwrap();
        let config = load_config(&path);
        assert_eq!(config.training.loop_count, 3);
        assert_eq!(config.samples_dir, AppConfig::default().samples_dir);
    }
}
