use crate::batch::BatchSettings;
use crate::compose::{DEFAULT_COMPANY_WRAP_WIDTH, DEFAULT_SCALE_FACTOR};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { delay_ms: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Fallback font family for text the rasterizer cannot resolve.
    pub font_family: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_family: "Inter".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding `badge-template-{1..4}.svg`.
    pub templates_dir: PathBuf,
    pub scale_factor: f64,
    pub default_location: String,
    pub company_wrap_width: usize,
    pub batch: BatchConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            scale_factor: DEFAULT_SCALE_FACTOR,
            default_location: "Belgium".to_string(),
            company_wrap_width: DEFAULT_COMPANY_WRAP_WIDTH,
            batch: BatchConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Config {
    pub fn batch_settings(&self) -> BatchSettings {
        BatchSettings {
            delay: Duration::from_millis(self.batch.delay_ms),
            scale: self.scale_factor,
            company_wrap_width: self.company_wrap_width,
            location: self.default_location.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct BatchConfigFile {
    delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    font_family: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    templates_dir: Option<PathBuf>,
    scale_factor: Option<f64>,
    default_location: Option<String>,
    company_wrap_width: Option<usize>,
    batch: Option<BatchConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(dir) = parsed.templates_dir {
        // Relative template directories resolve against the config file.
        config.templates_dir = match path.parent() {
            Some(parent) if dir.is_relative() => parent.join(dir),
            _ => dir,
        };
    }
    if let Some(v) = parsed.scale_factor {
        if v <= 0.0 || !v.is_finite() {
            anyhow::bail!("scaleFactor must be a positive number, got {v}");
        }
        config.scale_factor = v;
    }
    if let Some(v) = parsed.default_location {
        config.default_location = v;
    }
    if let Some(v) = parsed.company_wrap_width {
        config.company_wrap_width = v.max(1);
    }
    if let Some(batch) = parsed.batch {
        if let Some(v) = batch.delay_ms {
            config.batch.delay_ms = v;
        }
    }
    if let Some(render) = parsed.render {
        if let Some(v) = render.font_family {
            config.render.font_family = v;
        }
    }

    Ok(config)
}
