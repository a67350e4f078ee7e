// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for storyboard

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::StoryboardError;

const MM_TO_PT: f32 = 72.0 / 25.4;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Values given to new panels when a field is left empty
    #[serde(default)]
    pub panel_defaults: PanelDefaults,

    /// Accepted panel image files
    #[serde(default)]
    pub images: ImageConfig,

    /// PDF layout settings
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PanelDefaults {
    #[serde(default = "default_camera")]
    pub camera: String,
    #[serde(default = "default_movement")]
    pub movement: String,
    #[serde(default = "default_equipment")]
    pub equipment: String,
    #[serde(default = "default_setup_number")]
    pub setup_number: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ImageConfig {
    /// File extensions accepted for panel images (case-insensitive)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Directory inside a project that holds copied images
    #[serde(default = "default_images_dir")]
    pub directory: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExportConfig {
    #[serde(default)]
    pub page_size: PageSize,
    #[serde(default)]
    pub orientation: Orientation,
    /// Panels per row
    #[serde(default = "default_columns")]
    pub columns: usize,
    /// Rows per page
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default = "default_margin_mm")]
    pub margin_mm: f32,
    #[serde(default = "default_true")]
    pub page_numbers: bool,
    /// Longest side of an embedded image, in pixels
    #[serde(default = "default_image_max_px")]
    pub image_max_px: u32,
}

// Default value functions
fn default_camera() -> String { "Camera 1".to_string() }
fn default_movement() -> String { "STATIC".to_string() }
fn default_equipment() -> String { "STICKS".to_string() }
fn default_setup_number() -> String { "1".to_string() }
fn default_images_dir() -> String { "images".to_string() }
fn default_columns() -> usize { 4 }
fn default_rows() -> usize { 1 }
fn default_margin_mm() -> f32 { 10.0 }
fn default_true() -> bool { true }
fn default_image_max_px() -> u32 { 1200 }

fn default_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for PanelDefaults {
    fn default() -> Self {
        Self {
            camera: default_camera(),
            movement: default_movement(),
            equipment: default_equipment(),
            setup_number: default_setup_number(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            directory: default_images_dir(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            orientation: Orientation::default(),
            columns: default_columns(),
            rows: default_rows(),
            margin_mm: default_margin_mm(),
            page_numbers: true,
            image_max_px: default_image_max_px(),
        }
    }
}

impl ImageConfig {
    /// Whether a path carries one of the accepted extensions
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

impl ExportConfig {
    /// Page width and height in points, orientation applied
    pub fn page_dimensions(&self) -> (f32, f32) {
        let (short, long) = match self.page_size {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
        };
        match self.orientation {
            Orientation::Landscape => (long, short),
            Orientation::Portrait => (short, long),
        }
    }

    pub fn margin_pt(&self) -> f32 {
        self.margin_mm * MM_TO_PT
    }

    pub fn panels_per_page(&self) -> usize {
        self.columns * self.rows
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| StoryboardError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the exporter cannot lay out
    pub fn validate(&self) -> crate::Result<()> {
        let export = &self.export;
        if export.columns == 0 || export.rows == 0 {
            return Err(StoryboardError::Config(
                "export.columns and export.rows must be at least 1".to_string(),
            ));
        }
        if export.image_max_px == 0 {
            return Err(StoryboardError::Config("export.image_max_px must be positive".to_string()));
        }
        if !export.margin_mm.is_finite() || export.margin_mm < 0.0 {
            return Err(StoryboardError::Config("export.margin_mm must be a non-negative number".to_string()));
        }
        let (width, height) = export.page_dimensions();
        let margin = export.margin_pt();
        if width - 2.0 * margin < 100.0 || height - 2.0 * margin < 100.0 {
            return Err(StoryboardError::Config(format!(
                "export.margin_mm of {} leaves no room on the page",
                export.margin_mm
            )));
        }
        if self.images.extensions.is_empty() {
            return Err(StoryboardError::Config("images.extensions must not be empty".to_string()));
        }
        if self.images.directory.trim().is_empty() {
            return Err(StoryboardError::Config("images.directory must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.export.panels_per_page(), 4);
        assert_eq!(config.panel_defaults.camera, "Camera 1");
    }

    #[test]
    fn test_landscape_a4_dimensions() {
        let (w, h) = ExportConfig::default().page_dimensions();
        assert!(w > h);
        assert!((w - 841.89).abs() < 0.01);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"export": {"columns": 3, "page_size": "letter"}}"#).unwrap();
        assert_eq!(config.export.columns, 3);
        assert_eq!(config.export.rows, 1);
        assert_eq!(config.export.page_size, PageSize::Letter);
        assert!(config.images.accepts(Path::new("shot.PNG")));
        assert!(!config.images.accepts(Path::new("notes.txt")));
    }

    #[test]
    fn test_validate_rejects_zero_columns() {
        let mut config = AppConfig::default();
        config.export.columns = 0;
        assert!(matches!(config.validate(), Err(StoryboardError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_huge_margin() {
        let mut config = AppConfig::default();
        config.export.margin_mm = 120.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults_and_save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storyboard.json");
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.export.columns, 4);

        let mut changed = config.clone();
        changed.export.rows = 2;
        changed.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap().export.rows, 2);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storyboard.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(StoryboardError::Config(_))));
    }
}
