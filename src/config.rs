//! Run configuration: presets, ramp, font and media tool paths.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::media::FfmpegConfig;
use crate::ramp::{Ramp, RampKind};

/// Density and rate settings selectable by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub columns: u32,
    pub scale: f64,
    #[serde(default)]
    pub ramp: RampKind,
    /// Output rate; `None` keeps the source video's rate.
    #[serde(default)]
    pub fps: Option<u32>,
}

fn default_preset_name() -> String {
    "default".to_string()
}

fn default_font_size() -> f32 {
    12.0
}

fn default_glyph_scale() -> u32 {
    1
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub presets: HashMap<String, Preset>,
    #[serde(default = "default_preset_name")]
    pub default_preset: String,
    /// Overrides the preset ramp when set (darkest glyph first).
    #[serde(default)]
    pub custom_ramp: Option<String>,
    /// TrueType font to render with instead of the built-in bitmap font.
    #[serde(default)]
    pub font: Option<PathBuf>,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    /// Integer upscale of the built-in bitmap font.
    #[serde(default = "default_glyph_scale")]
    pub glyph_scale: u32,
    #[serde(default)]
    pub ffmpeg: FfmpegConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let default_toml = r#"
            default_preset = "default"

            [presets.default]
            columns = 120
            scale = 0.5
            ramp = "compact"

            [presets.small]
            columns = 80
            scale = 0.5
            ramp = "compact"

            [presets.large]
            columns = 240
            scale = 0.5
            ramp = "extended"
        "#;
        toml::from_str(default_toml).expect("built-in config is valid")
    }
}

impl AppConfig {
    /// Parse a config file, choosing TOML or JSON by extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&text).context("parsing config json")?,
            _ => toml::from_str(&text).context("parsing config toml")?,
        };
        config.validate().with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(ramp) = &self.custom_ramp {
            Ramp::custom(ramp)?;
        }
        if !self.presets.contains_key(&self.default_preset) {
            return Err(anyhow!("default preset '{}' is not defined", self.default_preset));
        }
        for (name, preset) in &self.presets {
            if preset.columns == 0 {
                return Err(anyhow!("preset '{}' has zero columns", name));
            }
            if !preset.scale.is_finite() || preset.scale <= 0.0 {
                return Err(anyhow!("preset '{}' has a non-positive scale", name));
            }
            if preset.fps == Some(0) {
                return Err(anyhow!("preset '{}' has fps 0", name));
            }
        }
        Ok(())
    }

    pub fn preset(&self, name: &str) -> Result<&Preset> {
        self.presets.get(name).ok_or_else(|| anyhow!("Preset '{}' not found", name))
    }
}

/// Config file candidates, most specific first.
pub fn config_candidates() -> Vec<PathBuf> {
    let mut tried = Vec::new();
    if let Some(mut dir) = dirs::data_dir() {
        dir.push("glyphcast");
        tried.push(dir.join("glyphcast.toml"));
        tried.push(dir.join("glyphcast.json"));
    }
    tried.push(PathBuf::from("glyphcast.toml"));
    tried.push(PathBuf::from("glyphcast.json"));
    tried
}

/// Load the explicit config, else the first candidate that exists, else the
/// built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return AppConfig::from_file(path);
    }
    for path in config_candidates() {
        if path.exists() {
            log::debug!("using config {}", path.display());
            return AppConfig::from_file(&path);
        }
    }
    Ok(AppConfig::default())
}
