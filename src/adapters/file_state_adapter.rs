//! JSON file state adapter.

use crate::domain::error::ExplorerError;
use crate::domain::state::DashboardState;
use crate::ports::state_port::StatePort;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub const DEFAULT_STATE_FILE: &str = "interface-state.json";

pub struct FileStateAdapter {
    path: PathBuf,
}

impl FileStateAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StatePort for FileStateAdapter {
    fn load(&self) -> Result<DashboardState, ExplorerError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("no state at {}, using defaults", self.path.display());
                return Ok(DashboardState::default());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content).map_err(|e| ExplorerError::State {
            reason: format!("invalid state file {}: {}", self.path.display(), e),
        })
    }

    fn save(&self, state: &DashboardState) -> Result<(), ExplorerError> {
        let json = serde_json::to_string_pretty(state).map_err(|e| ExplorerError::State {
            reason: format!("failed to serialize state: {}", e),
        })?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
