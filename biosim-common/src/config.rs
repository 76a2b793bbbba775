use crate::params::{DrugParams, OmicsParams, TumorParams};
use crate::vecmath::Bounds;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Odd multiplier used to derive independent per-engine seeds from the base seed.
const SEED_DERIVATION_PRIME: u64 = 0x9E37_79B9_7F4A_7C15;

// Size of the display surface handed to every engine
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct UniverseConfig {
    pub width: f32,
    pub height: f32,
}

// Configuration for the external tick source
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_frame_interval")]
    pub frame_interval_s: f64,
    pub total_ticks: u64,
    #[serde(default = "default_record_interval")]
    pub record_interval_ticks: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct InitialConditions {
    pub seed: u64,
}

// The "add drug" trigger and the spawn cadence it starts
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DrugTriggerConfig {
    /// Scheduler time at which the drug is added. `None` leaves the assay untreated.
    #[serde(default)]
    pub activate_at_s: Option<f64>,
    #[serde(default = "default_spawn_interval")]
    pub spawn_interval_s: f64,
}

impl Default for DrugTriggerConfig {
    fn default() -> Self {
        DrugTriggerConfig {
            activate_at_s: None,
            spawn_interval_s: default_spawn_interval(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Bincode,
    Messagepack,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    #[serde(default = "default_true")]
    pub save_snapshots: bool,
    /// Output format: "json", "bincode", "messagepack". Anything else falls back to JSON.
    pub format: Option<String>,
    /// Record full entity populations, not just metrics (can be very large).
    #[serde(default)]
    pub include_populations: bool,
    #[serde(default = "default_true")]
    pub save_metrics_csv: bool,
}

impl OutputConfig {
    /// Parsed format, or `None` if the configured name is not recognised.
    pub fn output_format(&self) -> Option<OutputFormat> {
        match self.format.as_deref().unwrap_or("json") {
            "json" => Some(OutputFormat::Json),
            "bincode" => Some(OutputFormat::Bincode),
            "messagepack" => Some(OutputFormat::Messagepack),
            _ => None,
        }
    }
}

fn default_frame_interval() -> f64 {
    0.016
}

fn default_record_interval() -> u64 {
    60
}

fn default_spawn_interval() -> f64 {
    0.1
}

fn default_true() -> bool {
    true
}

// Main run configuration, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub universe: UniverseConfig,
    pub timing: TimingConfig,
    pub initial_conditions: InitialConditions,
    #[serde(default)]
    pub drug_trigger: DrugTriggerConfig,
    #[serde(default)]
    pub tumor: TumorParams,
    #[serde(default)]
    pub omics: OmicsParams,
    #[serde(default)]
    pub drug: DrugParams,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the run configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))?;
        Ok(config)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(text)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.bounds().is_valid() {
            anyhow::bail!(
                "universe dimensions must be positive, got {}x{}.",
                self.universe.width,
                self.universe.height
            );
        }
        if !(self.timing.frame_interval_s.is_finite() && self.timing.frame_interval_s >= 1e-6) {
            anyhow::bail!("frame_interval_s must be at least one microsecond.");
        }
        if self.timing.record_interval_ticks == 0 {
            anyhow::bail!("record_interval_ticks must be greater than 0.");
        }
        if !(self.drug_trigger.spawn_interval_s.is_finite() && self.drug_trigger.spawn_interval_s >= 1e-6) {
            anyhow::bail!("spawn_interval_s must be at least one microsecond.");
        }
        if let Some(at) = self.drug_trigger.activate_at_s {
            if !(at.is_finite() && at >= 0.0) {
                anyhow::bail!("activate_at_s must be a non-negative time, got {}.", at);
            }
        }
        self.tumor.validate()?;
        self.omics.validate()?;
        self.drug.validate()?;
        Ok(())
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.universe.width, self.universe.height)
    }

    /// Independent seed for the engine at position `engine_index`.
    pub fn engine_seed(&self, engine_index: u64) -> u64 {
        self.initial_conditions
            .seed
            .wrapping_add(engine_index.wrapping_mul(SEED_DERIVATION_PRIME))
    }
}
