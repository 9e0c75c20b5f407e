use serde::Deserialize;
use std::{fs, path::Path};
use time::UtcOffset;

use crate::classify::DEFAULT_TECHNICAL_LOSS_PCT;

const CONFIG_ENV: &str = "DETECTION_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "detection-config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Loss percentage attributed to the network itself.
    pub expected_technical_loss_pct: f64,
    /// Fixed offset used to read hour-of-day from timestamps. 0 means UTC.
    pub utc_offset_minutes: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            expected_technical_loss_pct: DEFAULT_TECHNICAL_LOSS_PCT,
            utc_offset_minutes: 0,
        }
    }
}

impl EngineConfig {
    pub fn utc_offset(&self) -> anyhow::Result<UtcOffset> {
        let seconds = self.utc_offset_minutes.checked_mul(60).ok_or_else(|| {
            anyhow::anyhow!(
                "invalid engine.utc_offset_minutes {}: out of range",
                self.utc_offset_minutes
            )
        })?;
        UtcOffset::from_whole_seconds(seconds).map_err(|e| {
            anyhow::anyhow!(
                "invalid engine.utc_offset_minutes {}: {e}",
                self.utc_offset_minutes
            )
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub name: String,
    /// Readings kept per region as the historical window.
    pub history_window: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "readings".to_string(),
            history_window: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Load from the file named by `DETECTION_CONFIG`, falling back to
    /// `detection-config.toml`. Built-in defaults apply only when the variable
    /// is unset and the default file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let cfg = match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            Err(_) => {
                tracing::info!("no config file found, using defaults");
                Self::default()
            }
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config '{path}': {e}"))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.engine.expected_technical_loss_pct.is_finite() {
            anyhow::bail!("engine.expected_technical_loss_pct must be finite");
        }
        if self.pipeline.history_window == 0 {
            anyhow::bail!("pipeline.history_window must be at least 1");
        }
        self.engine.utc_offset()?;
        Ok(())
    }
}
