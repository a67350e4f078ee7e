// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Storyboard panels: one frame with an image and its shot metadata

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{ImageConfig, PanelDefaults};
use crate::{Result, StoryboardError};

/// A single storyboard panel.
///
/// Field names on disk follow the project file schema, so `shot_type`,
/// `movement`, `equipment` and `background` are written as `type`, `move`,
/// `equip` and `bgd`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    #[serde(default = "new_panel_id")]
    pub id: String,
    /// Zero-based position, kept contiguous by [`crate::Project`]
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub shot_number: String,
    #[serde(default)]
    pub scene_number: String,
    #[serde(default = "default_camera")]
    pub camera: String,
    #[serde(default)]
    pub lens: String,
    #[serde(default)]
    pub size: String,
    #[serde(rename = "type", default)]
    pub shot_type: String,
    #[serde(rename = "move", default = "default_movement")]
    pub movement: String,
    #[serde(rename = "equip", default = "default_equipment")]
    pub equipment: String,
    #[serde(default)]
    pub action: String,
    #[serde(rename = "bgd", with = "yes_no", default)]
    pub background: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    /// Background action notes, printed only when `background` is set
    #[serde(default)]
    pub bgd_notes: String,
    #[serde(default)]
    pub hair_makeup: String,
    #[serde(default)]
    pub props: String,
    #[serde(default)]
    pub vfx: String,
    /// Groups shots filmed from one camera setup
    #[serde(default = "default_setup_number")]
    pub setup_number: String,
    /// Body or operator name, e.g. "fx30"
    #[serde(default)]
    pub camera_name: String,
    /// Time budgeted to shoot
    #[serde(default)]
    pub shot_time: String,
    #[serde(default)]
    pub audio_notes: String,
    /// Who is on screen
    #[serde(default)]
    pub subject: String,
    /// Relative to the project directory once the project has been saved
    #[serde(default)]
    pub image_path: Option<PathBuf>,
}

fn new_panel_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_camera() -> String {
    PanelDefaults::default().camera
}

fn default_movement() -> String {
    PanelDefaults::default().movement
}

fn default_equipment() -> String {
    PanelDefaults::default().equipment
}

fn default_setup_number() -> String {
    PanelDefaults::default().setup_number
}

impl Panel {
    /// Create an empty panel carrying the configured defaults
    pub fn new(defaults: &PanelDefaults) -> Self {
        Self {
            id: new_panel_id(),
            order: 0,
            shot_number: String::new(),
            scene_number: String::new(),
            camera: defaults.camera.clone(),
            lens: String::new(),
            size: String::new(),
            shot_type: String::new(),
            movement: defaults.movement.clone(),
            equipment: defaults.equipment.clone(),
            action: String::new(),
            background: false,
            description: String::new(),
            notes: String::new(),
            bgd_notes: String::new(),
            hair_makeup: String::new(),
            props: String::new(),
            vfx: String::new(),
            setup_number: defaults.setup_number.clone(),
            camera_name: String::new(),
            shot_time: String::new(),
            audio_notes: String::new(),
            subject: String::new(),
            image_path: None,
        }
    }

    /// Shot number, or the one-based position when none was entered
    pub fn shot_label(&self) -> String {
        if self.shot_number.trim().is_empty() {
            (self.order + 1).to_string()
        } else {
            self.shot_number.trim().to_string()
        }
    }

    /// Name shown in panel listings, e.g. "Shot 12A"
    pub fn display_name(&self) -> String {
        format!("Shot {}", self.shot_label())
    }

    /// Scene and shot run together, e.g. "4" + "B" gives "4B"
    pub fn full_shot_number(&self) -> String {
        format!("{}{}", self.scene_number.trim(), self.shot_number.trim())
    }

    /// Camera with its name in brackets when one is set
    pub fn camera_label(&self) -> String {
        if self.camera_name.trim().is_empty() {
            self.camera.clone()
        } else {
            format!("{} ({})", self.camera, self.camera_name.trim())
        }
    }

    /// A copy with a fresh id, marked "(copy)" in its shot number
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = new_panel_id();
        copy.shot_number = if copy.shot_number.is_empty() {
            "(copy)".to_string()
        } else {
            format!("{} (copy)", copy.shot_number)
        };
        copy
    }
}

/// Input for creating or editing a panel.
///
/// Every field is optional: when adding, missing fields keep the panel
/// defaults; when editing, missing fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelData {
    pub shot_number: Option<String>,
    pub scene_number: Option<String>,
    pub camera: Option<String>,
    pub lens: Option<String>,
    pub size: Option<String>,
    pub shot_type: Option<String>,
    pub movement: Option<String>,
    pub equipment: Option<String>,
    pub action: Option<String>,
    pub background: Option<bool>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub bgd_notes: Option<String>,
    pub hair_makeup: Option<String>,
    pub props: Option<String>,
    pub vfx: Option<String>,
    pub setup_number: Option<String>,
    pub camera_name: Option<String>,
    pub shot_time: Option<String>,
    pub audio_notes: Option<String>,
    pub subject: Option<String>,
    pub image: Option<PathBuf>,
    pub clear_image: bool,
}

impl PanelData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shot_number(mut self, shot: impl Into<String>) -> Self {
        self.shot_number = Some(shot.into());
        self
    }

    pub fn with_scene_number(mut self, scene: impl Into<String>) -> Self {
        self.scene_number = Some(scene.into());
        self
    }

    pub fn with_camera(mut self, camera: impl Into<String>) -> Self {
        self.camera = Some(camera.into());
        self
    }

    pub fn with_lens(mut self, lens: impl Into<String>) -> Self {
        self.lens = Some(lens.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_shot_type(mut self, shot_type: impl Into<String>) -> Self {
        self.shot_type = Some(shot_type.into());
        self
    }

    pub fn with_movement(mut self, movement: impl Into<String>) -> Self {
        self.movement = Some(movement.into());
        self
    }

    pub fn with_equipment(mut self, equipment: impl Into<String>) -> Self {
        self.equipment = Some(equipment.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_background(mut self, background: bool) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_bgd_notes(mut self, notes: impl Into<String>) -> Self {
        self.bgd_notes = Some(notes.into());
        self
    }

    pub fn with_hair_makeup(mut self, notes: impl Into<String>) -> Self {
        self.hair_makeup = Some(notes.into());
        self
    }

    pub fn with_props(mut self, props: impl Into<String>) -> Self {
        self.props = Some(props.into());
        self
    }

    pub fn with_vfx(mut self, vfx: impl Into<String>) -> Self {
        self.vfx = Some(vfx.into());
        self
    }

    pub fn with_setup_number(mut self, setup: impl Into<String>) -> Self {
        self.setup_number = Some(setup.into());
        self
    }

    pub fn with_camera_name(mut self, name: impl Into<String>) -> Self {
        self.camera_name = Some(name.into());
        self
    }

    pub fn with_shot_time(mut self, time: impl Into<String>) -> Self {
        self.shot_time = Some(time.into());
        self
    }

    pub fn with_audio_notes(mut self, notes: impl Into<String>) -> Self {
        self.audio_notes = Some(notes.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image = Some(path.into());
        self.clear_image = false;
        self
    }

    pub fn without_image(mut self) -> Self {
        self.image = None;
        self.clear_image = true;
        self
    }

    /// Check the input before any panel is touched.
    ///
    /// The image path comes back absolute, so it still points at the same file
    /// once the panel belongs to a project in another directory.
    pub fn validate(mut self, images: &ImageConfig) -> Result<Self> {
        if let Some(path) = self.image.take() {
            validate_image(&path, images)?;
            self.image = Some(fs::canonicalize(&path)?);
        }
        Ok(self)
    }

    /// Copy every provided field onto `panel`
    pub fn apply_to(&self, panel: &mut Panel) {
        fn set(target: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                *target = v.trim().to_string();
            }
        }

        set(&mut panel.shot_number, &self.shot_number);
        set(&mut panel.scene_number, &self.scene_number);
        set(&mut panel.camera, &self.camera);
        set(&mut panel.lens, &self.lens);
        set(&mut panel.size, &self.size);
        set(&mut panel.shot_type, &self.shot_type);
        set(&mut panel.movement, &self.movement);
        set(&mut panel.equipment, &self.equipment);
        set(&mut panel.action, &self.action);
        set(&mut panel.description, &self.description);
        set(&mut panel.notes, &self.notes);
        set(&mut panel.bgd_notes, &self.bgd_notes);
        set(&mut panel.hair_makeup, &self.hair_makeup);
        set(&mut panel.props, &self.props);
        set(&mut panel.vfx, &self.vfx);
        set(&mut panel.setup_number, &self.setup_number);
        set(&mut panel.camera_name, &self.camera_name);
        set(&mut panel.shot_time, &self.shot_time);
        set(&mut panel.audio_notes, &self.audio_notes);
        set(&mut panel.subject, &self.subject);

        if let Some(background) = self.background {
            panel.background = background;
        }
        if self.clear_image {
            panel.image_path = None;
        } else if let Some(ref image) = self.image {
            panel.image_path = Some(image.clone());
        }
    }
}

/// Accept only existing files that carry an image extension and an image header
pub fn validate_image(path: &Path, images: &ImageConfig) -> Result<()> {
    if !path.is_file() {
        return Err(StoryboardError::validation(format!(
            "image file not found: {}",
            path.display()
        )));
    }
    if !images.accepts(path) {
        return Err(StoryboardError::validation(format!(
            "{} is not an image (accepted: {})",
            path.display(),
            images.extensions.join(", ")
        )));
    }
    image::image_dimensions(path).map_err(|e| {
        StoryboardError::validation(format!("{} is not a readable image: {}", path.display(), e))
    })?;
    Ok(())
}

/// The `bgd` field is stored as "Yes" / "No"
mod yes_no {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "Yes" } else { "No" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" => Ok(true),
            "no" | "n" | "false" | "" => Ok(false),
            other => Err(de::Error::custom(format!("expected \"Yes\" or \"No\" for bgd, got {:?}", other))),
        }
    }
}
