// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Storyboard projects: the ordered panel list and its project directory.
//!
//! A saved project is a directory holding `data.json` and an `images/`
//! folder. Panel images are copied into that folder on save and referenced
//! by relative path, so a project directory can be moved as a whole.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{AppConfig, ImageConfig, PanelDefaults};
use crate::panel::{Panel, PanelData};
use crate::{Result, StoryboardError};

/// Name of the project file inside a project directory
pub const PROJECT_FILE: &str = "data.json";

/// Current project file schema
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct ProjectFileRef<'a> {
    format_version: u32,
    name: &'a str,
    created_at: &'a DateTime<Utc>,
    panels: &'a [Panel],
}

#[derive(Deserialize)]
struct ProjectFile {
    #[serde(default)]
    format_version: Option<u32>,
    /// Desktop releases wrote `"version": "1.0"` and no `format_version`
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    panels: Vec<Panel>,
}

impl ProjectFile {
    fn check_version(&self) -> Result<()> {
        match (self.format_version, self.version.as_deref()) {
            (Some(FORMAT_VERSION), _) => Ok(()),
            (Some(other), _) => Err(StoryboardError::format(format!(
                "unsupported format version {} (expected {})",
                other, FORMAT_VERSION
            ))),
            (None, Some(legacy)) if legacy.split('.').next() == Some("1") => {
                debug!("Reading version {} project file", legacy);
                Ok(())
            }
            (None, Some(legacy)) => Err(StoryboardError::format(format!(
                "unsupported project version {:?}",
                legacy
            ))),
            (None, None) => Err(StoryboardError::format("missing format_version")),
        }
    }
}

/// An ordered storyboard
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    created_at: DateTime<Utc>,
    panels: Vec<Panel>,
    root: Option<PathBuf>,
    defaults: PanelDefaults,
    images: ImageConfig,
}

impl Project {
    /// Create an empty project with default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, &AppConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: &AppConfig) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            panels: Vec::new(),
            root: None,
            defaults: config.panel_defaults.clone(),
            images: config.images.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel(&self, position: usize) -> Option<&Panel> {
        self.panels.get(position)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Position and panel for a panel id
    pub fn find(&self, id: &str) -> Option<(usize, &Panel)> {
        self.panels.iter().enumerate().find(|(_, p)| p.id == id)
    }

    /// Absolute location of a panel's image, if it has one
    pub fn image_location(&self, panel: &Panel) -> Option<PathBuf> {
        panel.image_path.as_ref().map(|p| self.resolve(p))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match self.root {
            Some(ref root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Append a panel built from `data`
    pub fn add_panel(&mut self, data: PanelData) -> Result<&Panel> {
        let position = self.panels.len();
        self.insert_panel(position, data)
    }

    /// Insert a panel at `position`; `position == len()` appends.
    ///
    /// An empty scene number or camera is carried over from the panel before
    /// the insertion point.
    pub fn insert_panel(&mut self, position: usize, data: PanelData) -> Result<&Panel> {
        let len = self.panels.len();
        if position > len {
            return Err(StoryboardError::Range { from: position, to: position, len });
        }
        let mut data = data.validate(&self.images)?;

        let mut panel = Panel::new(&self.defaults);
        if let Some(previous) = position.checked_sub(1).and_then(|i| self.panels.get(i)) {
            if is_blank(&data.scene_number) {
                data.scene_number = None;
                panel.scene_number = previous.scene_number.clone();
            }
            if is_blank(&data.camera) {
                data.camera = None;
                panel.camera = previous.camera.clone();
            }
        }
        data.apply_to(&mut panel);

        debug!("Adding panel {} at position {}", panel.id, position);
        self.panels.insert(position, panel);
        self.renumber();
        Ok(&self.panels[position])
    }

    /// Remove and return the panel at `position`
    pub fn remove_panel(&mut self, position: usize) -> Result<Panel> {
        if position >= self.panels.len() {
            return Err(StoryboardError::NotFound { position, len: self.panels.len() });
        }
        let panel = self.panels.remove(position);
        self.renumber();
        debug!("Removed panel {} from position {}", panel.id, position);
        Ok(panel)
    }

    /// Move one panel to `to`, shifting the panels in between
    pub fn move_panel(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.panels.len();
        if from >= len || to >= len {
            return Err(StoryboardError::Range { from, to, len });
        }
        if from == to {
            return Ok(());
        }
        let panel = self.panels.remove(from);
        self.panels.insert(to, panel);
        self.renumber();
        debug!("Moved panel from {} to {}", from, to);
        Ok(())
    }

    /// Swap the panel with the one before it
    pub fn move_up(&mut self, position: usize) -> Result<()> {
        let to = position.checked_sub(1).ok_or(StoryboardError::Range {
            from: position,
            to: position,
            len: self.panels.len(),
        })?;
        self.move_panel(position, to)
    }

    /// Swap the panel with the one after it
    pub fn move_down(&mut self, position: usize) -> Result<()> {
        self.move_panel(position, position + 1)
    }

    /// Overwrite the fields given in `data` on an existing panel
    pub fn update_panel(&mut self, position: usize, data: PanelData) -> Result<&Panel> {
        if position >= self.panels.len() {
            return Err(StoryboardError::NotFound { position, len: self.panels.len() });
        }
        let data = data.validate(&self.images)?;
        let panel = &mut self.panels[position];
        data.apply_to(panel);
        Ok(&self.panels[position])
    }

    /// Insert a copy of the panel at `position` right after it
    pub fn duplicate_panel(&mut self, position: usize) -> Result<&Panel> {
        let original = self.panels.get(position).ok_or(StoryboardError::NotFound {
            position,
            len: self.panels.len(),
        })?;
        let copy = original.duplicate();
        debug!("Duplicated panel {} as {}", original.id, copy.id);
        self.panels.insert(position + 1, copy);
        self.renumber();
        Ok(&self.panels[position + 1])
    }

    fn renumber(&mut self) {
        for (i, panel) in self.panels.iter_mut().enumerate() {
            panel.order = i;
        }
    }

    /// Serialize the project file as it would be written by [`Project::save`]
    pub fn to_json(&self) -> Result<String> {
        let file = ProjectFileRef {
            format_version: FORMAT_VERSION,
            name: &self.name,
            created_at: &self.created_at,
            panels: &self.panels,
        };
        let mut json = serde_json::to_string_pretty(&file)?;
        json.push('\n');
        Ok(json)
    }

    /// Parse a project file; relative image paths stay relative
    pub fn from_json_slice(bytes: &[u8], config: &AppConfig) -> Result<Self> {
        let file: ProjectFile = serde_json::from_slice(bytes)
            .map_err(|e| StoryboardError::format(format!("cannot parse project: {}", e)))?;

        file.check_version()?;

        let mut seen = HashSet::new();
        for panel in &file.panels {
            if !seen.insert(panel.id.as_str()) {
                return Err(StoryboardError::format(format!("duplicate panel id {}", panel.id)));
            }
        }

        let mut project = Self::with_config(file.name, config);
        project.created_at = file.created_at;
        project.panels = file.panels;
        project.panels.sort_by_key(|p| p.order);
        project.renumber();
        Ok(project)
    }

    /// Load a project directory (or its `data.json`) with default settings
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_config(path, &AppConfig::default())
    }

    pub fn load_with_config(path: &Path, config: &AppConfig) -> Result<Self> {
        let (dir, file) = project_paths(path);
        let bytes = fs::read(&file)
            .map_err(|e| StoryboardError::format(format!("cannot read {}: {}", file.display(), e)))?;

        let mut project = Self::from_json_slice(&bytes, config)?;
        if project.name.trim().is_empty() {
            project.name = directory_name(&dir);
        }
        project.root = Some(dir);

        for panel in &project.panels {
            if let Some(location) = project.image_location(panel) {
                if !location.exists() {
                    warn!("Image for {} not found: {:?}", panel.display_name(), location);
                }
            }
        }

        info!("Loaded project '{}' with {} panels from {:?}", project.name, project.len(), file);
        Ok(project)
    }

    /// Save into a project directory, copying panel images into it.
    ///
    /// Returns the path of the written project file. Nothing in memory changes
    /// unless the write succeeds, and images copied by a failed save are
    /// removed again.
    pub fn save(&mut self, path: &Path) -> Result<PathBuf> {
        let (dir, file) = project_paths(path);
        let mut copied = Vec::new();

        match self.write_project(&dir, &file, &mut copied) {
            Ok(staged) => {
                *self = staged;
                info!("Saved project '{}' ({} panels) to {:?}", self.name, self.len(), file);
                Ok(file)
            }
            Err(e) => {
                for image in &copied {
                    debug!("Removing {:?} after failed save", image);
                    let _ = fs::remove_file(image);
                }
                Err(e)
            }
        }
    }

    fn write_project(&self, dir: &Path, file: &Path, copied: &mut Vec<PathBuf>) -> Result<Self> {
        let images_dir = dir.join(&self.images.directory);
        fs::create_dir_all(&images_dir)?;

        let mut staged = self.clone();
        for panel in staged.panels.iter_mut() {
            if let Some(current) = panel.image_path.take() {
                panel.image_path = Some(self.stage_image(&panel.id, &current, dir, copied)?);
            }
        }
        if staged.name.trim().is_empty() {
            staged.name = directory_name(dir);
        }
        let json = staged.to_json()?;

        let tmp = dir.join(format!(".{}.tmp", PROJECT_FILE));
        fs::write(&tmp, json.as_bytes())?;
        if let Err(e) = fs::rename(&tmp, file) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        staged.root = Some(dir.to_path_buf());
        Ok(staged)
    }

    /// Copy one image into `<dir>/images/` and return its relative path
    fn stage_image(&self, id: &str, current: &Path, dir: &Path, copied: &mut Vec<PathBuf>) -> Result<PathBuf> {
        let source = self.resolve(current);
        if !source.exists() {
            warn!("Image {:?} is missing, keeping the reference as is", source);
            return Ok(current.to_path_buf());
        }

        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StoryboardError::validation(format!("bad image file name: {}", source.display())))?;
        let prefix = format!("{}_", id);
        let stored_name = if file_name.starts_with(&prefix) {
            file_name.to_string()
        } else {
            format!("{}{}", prefix, file_name)
        };

        let relative = Path::new(&self.images.directory).join(stored_name);
        let dest = dir.join(&relative);
        if !same_file(&source, &dest) {
            debug!("Copying image {:?} -> {:?}", source, dest);
            let existed = dest.exists();
            fs::copy(&source, &dest)?;
            if !existed {
                copied.push(dest);
            }
        }
        Ok(relative)
    }
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true)
}

/// Split a user path into the project directory and its project file
fn project_paths(path: &Path) -> (PathBuf, PathBuf) {
    let names_file = path.file_name().map(|n| n == PROJECT_FILE).unwrap_or(false);
    if names_file || path.is_file() {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        (dir, path.to_path_buf())
    } else {
        (path.to_path_buf(), path.join(PROJECT_FILE))
    }
}

fn directory_name(dir: &Path) -> String {
    fs::canonicalize(dir)
        .ok()
        .as_deref()
        .unwrap_or(dir)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Storyboard".to_string())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::from_pixel(16, 9, image::Rgb([20, 90, 160])).save(&path).unwrap();
        path
    }

    fn shots(project: &Project) -> Vec<String> {
        project.panels().iter().map(|p| p.shot_number.clone()).collect()
    }

    fn abc() -> Project {
        let mut project = Project::new("Test Film");
        for shot in ["A", "B", "C"] {
            project.add_panel(PanelData::new().with_shot_number(shot)).unwrap();
        }
        project
    }

    fn assert_contiguous(project: &Project) {
        for (i, panel) in project.panels().iter().enumerate() {
            assert_eq!(panel.order, i);
        }
    }

    #[test]
    fn test_add_appends_in_order() {
        let project = abc();
        assert_eq!(shots(&project), ["A", "B", "C"]);
        assert_contiguous(&project);
    }

    #[test]
    fn test_add_inherits_scene_and_camera() {
        let mut project = Project::new("Test Film");
        project
            .add_panel(PanelData::new().with_scene_number("12").with_camera("Camera 2"))
            .unwrap();
        let second = project.add_panel(PanelData::new().with_shot_number("2")).unwrap();
        assert_eq!(second.scene_number, "12");
        assert_eq!(second.camera, "Camera 2");

        let third = project.add_panel(PanelData::new().with_scene_number("13")).unwrap();
        assert_eq!(third.scene_number, "13");
        assert_eq!(third.camera, "Camera 2");
    }

    #[test]
    fn test_add_rejects_non_image_without_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        fs::write(&txt, "not an image").unwrap();

        let mut project = abc();
        let err = project.add_panel(PanelData::new().with_image(&txt)).unwrap_err();
        assert!(matches!(err, StoryboardError::Validation(_)));
        assert_eq!(shots(&project), ["A", "B", "C"]);
    }

    #[test]
    fn test_insert_in_middle() {
        let mut project = abc();
        project.insert_panel(1, PanelData::new().with_shot_number("X")).unwrap();
        assert_eq!(shots(&project), ["A", "X", "B", "C"]);
        assert_contiguous(&project);

        let err = project.insert_panel(9, PanelData::new()).unwrap_err();
        assert!(matches!(err, StoryboardError::Range { from: 9, to: 9, len: 4 }));
        assert!(matches!(
            Project::new("x").insert_panel(2, PanelData::new()),
            Err(StoryboardError::Range { from: 2, len: 0, .. })
        ));
        assert_eq!(shots(&project), ["A", "X", "B", "C"]);
    }

    #[test]
    fn test_blank_scene_and_camera_are_inherited() {
        let mut project = Project::new("Test Film");
        project
            .add_panel(PanelData::new().with_scene_number("4").with_camera("Camera 3"))
            .unwrap();
        let second = project
            .add_panel(PanelData::new().with_scene_number("").with_camera("   "))
            .unwrap();
        assert_eq!(second.scene_number, "4");
        assert_eq!(second.camera, "Camera 3");
    }

    #[test]
    fn test_duplicate_inserts_copy_after_original() {
        let mut project = abc();
        let original = project.panel(0).unwrap().clone();
        let copy = project.duplicate_panel(0).unwrap().clone();
        assert_eq!(shots(&project), ["A", "A (copy)", "B", "C"]);
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.order, 1);
        assert_eq!(copy.camera, original.camera);
        assert_contiguous(&project);

        assert!(matches!(project.duplicate_panel(4), Err(StoryboardError::NotFound { position: 4, len: 4 })));
        assert_eq!(project.len(), 4);
    }

    #[test]
    fn test_duplicate_with_image_saves_its_own_copy() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let png = write_png(src.path(), "frame.png");

        let mut project = Project::new("Dup");
        project.add_panel(PanelData::new().with_image(&png)).unwrap();
        project.save(out.path()).unwrap();
        project.duplicate_panel(0).unwrap();
        project.save(out.path()).unwrap();

        let first = project.panels()[0].image_path.clone().unwrap();
        let second = project.panels()[1].image_path.clone().unwrap();
        assert_ne!(first, second);
        assert!(out.path().join(&second).exists());
        assert_eq!(fs::read_dir(out.path().join("images")).unwrap().count(), 2);
    }

    #[test]
    fn test_relative_image_path_is_copied_on_save() {
        // A path relative to the working directory, not to the project
        let cwd_dir = tempfile::tempdir_in(".").unwrap();
        let png = write_png(cwd_dir.path(), "frame.png");
        assert!(png.is_relative());

        let film = tempfile::tempdir().unwrap();
        Project::new("Film").save(film.path()).unwrap();
        let mut project = Project::load(film.path()).unwrap();
        project.add_panel(PanelData::new().with_image(&png)).unwrap();
        project.save(film.path()).unwrap();

        let stored = project.panels()[0].image_path.clone().unwrap();
        assert!(stored.starts_with("images"));
        assert!(film.path().join(&stored).exists());
        assert_eq!(fs::read_dir(film.path().join("images")).unwrap().count(), 1);

        let reloaded = Project::load(film.path()).unwrap();
        assert!(reloaded.image_location(&reloaded.panels()[0]).unwrap().exists());
    }

    #[test]
    fn test_failed_save_removes_copied_images() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let png = write_png(src.path(), "good.png");
        let not_a_file = src.path().join("folder.png");
        fs::create_dir(&not_a_file).unwrap();

        let body = serde_json::json!({
            "format_version": 1,
            "name": "Half",
            "panels": [
                {"id": "a", "order": 0, "image_path": png},
                {"id": "b", "order": 1, "image_path": not_a_file},
            ]
        });
        fs::write(src.path().join(PROJECT_FILE), body.to_string()).unwrap();

        let mut project = Project::load(src.path()).unwrap();
        let before = project.panels().to_vec();
        assert!(project.save(out.path()).is_err());

        assert_eq!(fs::read_dir(out.path().join("images")).unwrap().count(), 0);
        assert!(!out.path().join(PROJECT_FILE).exists());
        assert_eq!(project.panels(), before.as_slice());
    }

    #[test]
    fn test_loads_desktop_version_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("film.sbp");
        fs::write(
            &file,
            r#"{
              "version": "1.0",
              "panels": [
                {"id": "p2", "order": 1, "shot_number": "B", "scene_number": "1", "bgd": "Yes",
                 "bgd_notes": "crowd", "setup_number": "2", "camera_name": "fx30",
                 "image_path": null, "last_modified": "2024-05-01T10:00:00"},
                {"id": "p1", "order": 0, "shot_number": "A", "scene_number": "1",
                 "subject": "Mara", "shot_time": "20m", "image_path": null}
              ]
            }"#,
        )
        .unwrap();

        let project = Project::load(&file).unwrap();
        assert_eq!(shots(&project), ["A", "B"]);
        assert_eq!(project.panels()[0].subject, "Mara");
        assert_eq!(project.panels()[0].setup_number, "1");
        assert_eq!(project.panels()[1].bgd_notes, "crowd");
        assert_eq!(project.panels()[1].camera_label(), "Camera 1 (fx30)");
        assert!(project.panels()[1].background);
        assert!(project.to_json().unwrap().contains("\"format_version\": 1"));
    }

    #[test]
    fn test_move_first_to_last() {
        let mut project = abc();
        project.move_panel(0, 2).unwrap();
        assert_eq!(shots(&project), ["B", "C", "A"]);
        assert_contiguous(&project);
    }

    #[test]
    fn test_move_preserves_relative_order_of_others() {
        let mut project = Project::new("Long");
        for shot in ["1", "2", "3", "4", "5", "6"] {
            project.add_panel(PanelData::new().with_shot_number(shot)).unwrap();
        }
        for (from, to) in [(4, 1), (0, 5), (2, 3), (5, 0)] {
            let before = shots(&project);
            let moved = before[from].clone();
            project.move_panel(from, to).unwrap();
            let after = shots(&project);
            assert_eq!(after[to], moved);

            let others_before: Vec<_> = before.iter().filter(|s| **s != moved).collect();
            let others_after: Vec<_> = after.iter().filter(|s| **s != moved).collect();
            assert_eq!(others_before, others_after);
            assert_contiguous(&project);
        }
    }

    #[test]
    fn test_move_same_position_is_noop() {
        let mut project = abc();
        project.move_panel(1, 1).unwrap();
        assert_eq!(shots(&project), ["A", "B", "C"]);
    }

    #[test]
    fn test_out_of_range_fails_without_mutation() {
        let mut project = abc();
        let ids: Vec<_> = project.panels().iter().map(|p| p.id.clone()).collect();

        assert!(matches!(project.move_panel(0, 3), Err(StoryboardError::Range { from: 0, to: 3, len: 3 })));
        assert!(matches!(project.move_panel(5, 0), Err(StoryboardError::Range { .. })));
        assert!(matches!(project.move_panel(3, 3), Err(StoryboardError::Range { .. })));
        assert!(matches!(project.remove_panel(3), Err(StoryboardError::NotFound { position: 3, len: 3 })));
        assert!(project.move_up(0).is_err());
        assert!(project.move_down(2).is_err());
        assert!(project.update_panel(7, PanelData::new().with_lens("35mm")).is_err());

        let after: Vec<_> = project.panels().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, after);
        assert_contiguous(&project);
    }

    #[test]
    fn test_up_and_down() {
        let mut project = abc();
        project.move_down(0).unwrap();
        assert_eq!(shots(&project), ["B", "A", "C"]);
        project.move_up(2).unwrap();
        assert_eq!(shots(&project), ["B", "C", "A"]);
    }

    #[test]
    fn test_add_then_remove_restores_sequence() {
        let mut project = abc();
        let before = project.panels().to_vec();
        let position = project.add_panel(PanelData::new().with_shot_number("D")).unwrap().order;
        let removed = project.remove_panel(position).unwrap();
        assert_eq!(removed.shot_number, "D");
        assert_eq!(project.panels(), before.as_slice());
    }

    #[test]
    fn test_remove_compacts_positions() {
        let mut project = abc();
        project.remove_panel(0).unwrap();
        assert_eq!(shots(&project), ["B", "C"]);
        assert_contiguous(&project);
    }

    #[test]
    fn test_update_keeps_identity() {
        let mut project = abc();
        let id = project.panel(1).unwrap().id.clone();
        let panel = project
            .update_panel(1, PanelData::new().with_size("CLOSE UP").with_lens("85mm"))
            .unwrap();
        assert_eq!(panel.id, id);
        assert_eq!(panel.shot_number, "B");
        assert_eq!(panel.size, "CLOSE UP");
        assert_eq!(project.find(&id).map(|(i, _)| i), Some(1));
    }

    #[test]
    fn test_save_copies_images_and_uses_relative_paths() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let png = write_png(src.path(), "frame.png");

        let mut project = Project::new("Copy Test");
        project.add_panel(PanelData::new().with_image(&png)).unwrap();
        let file = project.save(out.path()).unwrap();
        assert_eq!(file, out.path().join(PROJECT_FILE));

        let panel = &project.panels()[0];
        let relative = panel.image_path.clone().unwrap();
        assert!(relative.is_relative());
        assert!(relative.starts_with("images"));
        assert!(relative.to_string_lossy().ends_with("_frame.png"));
        assert!(out.path().join(&relative).exists());
        assert_eq!(project.image_location(panel).unwrap(), out.path().join(&relative));
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let src = tempfile::tempdir().unwrap();
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let png = write_png(src.path(), "wide.png");

        let mut project = abc();
        project
            .add_panel(
                PanelData::new()
                    .with_image(&png)
                    .with_action("Hero enters")
                    .with_background(true)
                    .with_notes("rain machine"),
            )
            .unwrap();
        project.save(first.path()).unwrap();
        let saved = fs::read_to_string(first.path().join(PROJECT_FILE)).unwrap();

        let mut loaded = Project::load(first.path()).unwrap();
        assert_eq!(loaded.panels(), project.panels());
        assert_eq!(loaded.name(), "Test Film");
        assert_eq!(loaded.created_at(), project.created_at());

        loaded.save(second.path()).unwrap();
        let resaved = fs::read_to_string(second.path().join(PROJECT_FILE)).unwrap();
        assert_eq!(saved, resaved);
        assert_eq!(loaded.to_json().unwrap(), saved);
    }

    #[test]
    fn test_save_in_place_does_not_duplicate_images() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let png = write_png(src.path(), "frame.png");

        let mut project = Project::new("In Place");
        project.add_panel(PanelData::new().with_image(&png)).unwrap();
        project.save(out.path()).unwrap();
        let first = project.panels()[0].image_path.clone();
        project.save(out.path()).unwrap();
        assert_eq!(project.panels()[0].image_path, first);
        assert_eq!(fs::read_dir(out.path().join("images")).unwrap().count(), 1);
    }

    #[test]
    fn test_load_sorts_by_order_and_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_FILE),
            r#"{
                "format_version": 1,
                "name": "",
                "panels": [
                    {"id": "b", "order": 5, "shot_number": "2"},
                    {"id": "a", "order": 1, "shot_number": "1", "bgd": "Yes"}
                ]
            }"#,
        )
        .unwrap();

        let project = Project::load(&dir.path().join(PROJECT_FILE)).unwrap();
        assert_eq!(shots(&project), ["1", "2"]);
        assert_contiguous(&project);
        assert!(project.panels()[0].background);
        assert_eq!(project.panels()[1].equipment, "STICKS");
        assert!(!project.name().is_empty());
    }

    #[test]
    fn test_load_rejects_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(PROJECT_FILE);

        assert!(matches!(Project::load(dir.path()), Err(StoryboardError::Format(_))));

        for body in [
            "{ not json",
            r#"{"format_version": 1, "name": "x"}"#,
            r#"{"format_version": 2, "name": "x", "panels": []}"#,
            r#"{"name": "x", "panels": []}"#,
            r#"{"version": "2.0", "panels": []}"#,
            r#"{"format_version": 1, "name": "x", "panels": [{"id": "a", "order": "first"}]}"#,
            r#"{"format_version": 1, "name": "x", "panels": [{"id": "a"}, {"id": "a"}]}"#,
        ] {
            fs::write(&file, body).unwrap();
            let err = Project::load(dir.path()).unwrap_err();
            assert!(matches!(err, StoryboardError::Format(_)), "{} gave {:?}", body, err);
        }
    }

    #[test]
    fn test_failed_load_keeps_previous_project() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PROJECT_FILE), "[]").unwrap();

        let mut current = abc();
        match Project::load(dir.path()) {
            Ok(loaded) => current = loaded,
            Err(e) => assert!(matches!(e, StoryboardError::Format(_))),
        }
        assert_eq!(shots(&current), ["A", "B", "C"]);
    }

    #[test]
    fn test_missing_image_is_kept_on_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_FILE),
            r#"{"format_version": 1, "name": "Gone", "panels": [{"id": "a", "image_path": "images/a_gone.png"}]}"#,
        )
        .unwrap();
        let project = Project::load(dir.path()).unwrap();
        assert_eq!(project.panels()[0].image_path, Some(PathBuf::from("images/a_gone.png")));
    }

    #[test]
    fn test_project_paths() {
        assert_eq!(
            project_paths(Path::new("film/data.json")),
            (PathBuf::from("film"), PathBuf::from("film/data.json"))
        );
        assert_eq!(
            project_paths(Path::new("data.json")),
            (PathBuf::from("."), PathBuf::from("data.json"))
        );
        assert_eq!(
            project_paths(Path::new("/nonexistent/film")),
            (PathBuf::from("/nonexistent/film"), PathBuf::from("/nonexistent/film/data.json"))
        );
    }
}
