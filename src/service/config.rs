use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{
    capture::recorder::CaptureOpts,
    foundation::error::{OrrbError, OrrbResult},
    service::queue::QueueOpts,
};

/// Render server configuration.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Dispatcher wake-up tuning.
    pub queue: QueueOpts,
    /// Capture pipeline tuning.
    pub capture: CaptureOpts,
    /// Name of the simulation thread.
    pub thread_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            queue: QueueOpts::default(),
            capture: CaptureOpts::default(),
            thread_name: "orrb-sim".to_owned(),
        }
    }
}

impl ServerConfig {
    /// Parse a config from a JSON reader. Missing fields take their defaults.
    pub fn from_reader<R: std::io::Read>(r: R) -> OrrbResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| OrrbError::config(format!("parse server config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> OrrbResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            OrrbError::config(format!("open server config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> OrrbResult<()> {
        if self.thread_name.trim().is_empty() {
            return Err(OrrbError::config("thread_name must be non-empty"));
        }
        if self.capture.trim.factor == 0 {
            return Err(OrrbError::config("capture.trim.factor must be >= 1"));
        }
        if self.capture.max_surface_bytes == Some(0) {
            return Err(OrrbError::config("capture.max_surface_bytes must be positive or null"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/config.rs"]
mod tests;
