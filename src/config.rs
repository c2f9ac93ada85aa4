// config.rs — command line and JSON session configuration

use crate::camera::DragMode;
use crate::session::SessionOptions;
use clap::Parser;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{field} must be a positive number, got {value}")]
    NotPositive { field: &'static str, value: f32 },
}

#[derive(Parser, Debug)]
#[command(name = "hotspot-panorama", about = "360° panorama viewer with hotspot labels")]
#[command(version)]
pub struct Cli {
    /// Session config (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Panorama image, overrides the config
    #[arg(long)]
    pub texture: Option<PathBuf>,

    /// Hotspot mask image, overrides the config
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// How drag movement accumulates
    #[arg(long, value_enum)]
    pub drag_mode: Option<DragMode>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn default_sensitivity() -> f32 {
    1.0
}

fn default_zoom_step() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewerConfig {
    #[serde(default)]
    pub texture: String,
    /// Empty disables hotspots.
    #[serde(default)]
    pub mask: String,
    /// `"R,G,B"` -> label.
    #[serde(default)]
    pub hotspots: HashMap<String, String>,
    #[serde(default)]
    pub drag_mode: DragMode,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f32,
    #[serde(default)]
    pub label_font: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            texture: String::new(),
            mask: String::new(),
            hotspots: HashMap::new(),
            drag_mode: DragMode::default(),
            sensitivity: default_sensitivity(),
            zoom_step: default_zoom_step(),
            label_font: None,
        }
    }
}

impl ViewerConfig {
    pub fn from_json(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let cfg: ViewerConfig = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    /// Config file (if any) with command line overrides applied.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut cfg = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(texture) = &cli.texture {
            cfg.texture = texture.display().to_string();
        }
        if let Some(mask) = &cli.mask {
            cfg.mask = mask.display().to_string();
        }
        if let Some(mode) = cli.drag_mode {
            cfg.drag_mode = mode;
        }
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("sensitivity", self.sensitivity), ("zoom_step", self.zoom_step)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        Ok(())
    }

    pub fn texture_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.texture)
    }

    pub fn mask_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.mask)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            drag_mode: self.drag_mode,
            sensitivity: self.sensitivity,
            zoom_step: self.zoom_step,
            hotspots_enabled: self.mask_path().is_some(),
        }
    }
}

fn non_empty_path(s: &str) -> Option<PathBuf> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(PathBuf::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_config() {
        let json = r#"{
            "texture": "nice.jpg",
            "mask": "nice_mask.png",
            "hotspots": { "255,0,0": "Outlet 1", "245,0,0": "Window 1" },
            "drag_mode": "incremental",
            "sensitivity": 0.5,
            "zoom_step": 5
        }"#;
        let cfg = ViewerConfig::from_json(json, Path::new("test.json")).expect("config");
        assert_eq!(cfg.texture_path(), Some(PathBuf::from("nice.jpg")));
        assert_eq!(cfg.hotspots.get("255,0,0").map(String::as_str), Some("Outlet 1"));
        assert_eq!(cfg.drag_mode, DragMode::Incremental);
        let opts = cfg.session_options();
        assert!(opts.hotspots_enabled);
        assert_eq!(opts.sensitivity, 0.5);
        assert_eq!(opts.zoom_step, 5.0);
    }

    #[test]
    fn empty_mask_disables_hotspots() {
        let json = r#"{ "texture": "nice.jpg", "mask": "" }"#;
        let cfg = ViewerConfig::from_json(json, Path::new("test.json")).expect("config");
        assert_eq!(cfg.mask_path(), None);
        assert!(!cfg.session_options().hotspots_enabled);
        assert_eq!(cfg.drag_mode, DragMode::Anchored);
        assert_eq!(cfg.sensitivity, 1.0);
    }

    #[test]
    fn rejects_bad_values() {
        let err = ViewerConfig::from_json(r#"{ "zoom_step": 0 }"#, Path::new("x.json"))
            .expect_err("zero step");
        assert!(matches!(err, ConfigError::NotPositive { field: "zoom_step", .. }));

        let err = ViewerConfig::from_json(r#"{ "texure": "typo.jpg" }"#, Path::new("x.json"))
            .expect_err("unknown field");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn loads_from_file_and_applies_overrides() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "texture": "a.jpg", "mask": "a_mask.png" }}"#).expect("write");

        let cli = Cli::parse_from([
            "hotspot-panorama",
            "--config",
            file.path().to_str().expect("utf-8 path"),
            "--texture",
            "b.jpg",
            "--drag-mode",
            "incremental",
        ]);
        let cfg = ViewerConfig::resolve(&cli).expect("config");
        assert_eq!(cfg.texture, "b.jpg");
        assert_eq!(cfg.mask, "a_mask.png");
        assert_eq!(cfg.drag_mode, DragMode::Incremental);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = ViewerConfig::load(Path::new("/definitely/not/here.json")).expect_err("missing");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
