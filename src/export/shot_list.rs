// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Shot lists: the storyboard as a table in shooting order.
//!
//! Panels can be narrowed to one camera, scene or setup, and are sorted by
//! scene, then setup, then shot number. Scene and setup values that are plain
//! numbers sort numerically and come before any other value.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info, warn};

use super::layout::{
    fit_image, fit_line, wrap_text, Rect, Rgb, BLACK, DARK_GREY, FOOTER_SIZE, LIGHT_GREY, TITLE_SIZE, WHITE,
};
use super::pdf::{Canvas, PdfWriter, BOLD, REGULAR};
use super::{decode_image, write_atomically, xml, ExportSummary};
use crate::config::ExportConfig;
use crate::panel::Panel;
use crate::project::Project;
use crate::Result;

const CELL_SIZE: f32 = 8.0;
const CELL_LEADING: f32 = 9.5;
const HEADING_SIZE: f32 = 9.0;
const HEADING_ROW: f32 = 20.0;
const SHOT_ROW: f32 = 40.0;
const INTRO_BAND: f32 = 62.0;
const FOOTER_BAND: f32 = 16.0;
const THUMBNAIL_PX: u32 = 240;

/// Camera colours used in the camera column and the legend
pub const CAMERA_COLORS: [(&str, Rgb); 6] = [
    ("Camera 1", (0.0, 0.392, 0.0)),     // dark green
    ("Camera 2", (0.545, 0.0, 0.0)),     // dark red
    ("Camera 3", (0.502, 0.0, 0.502)),   // purple
    ("Camera 4", (0.0, 0.0, 1.0)),       // blue
    ("Camera 5", (1.0, 0.647, 0.0)),     // orange
    ("Camera 6", (0.647, 0.165, 0.165)), // brown
];

/// Column heading, relative width in cm, and whether values are centred
const COLUMNS: [(&str, f32, bool); 13] = [
    ("Scene", 1.5, true),
    ("Shot", 1.5, true),
    ("Setup", 1.5, true),
    ("Camera", 2.0, true),
    ("Subject", 3.0, false),
    ("Time", 1.5, true),
    ("Size", 2.0, true),
    ("Move", 2.0, true),
    ("Lens", 1.5, true),
    ("Description", 4.0, false),
    ("Notes", 4.0, false),
    ("Audio", 3.0, false),
    ("Image", 2.5, true),
];

const CAMERA_COLUMN: usize = 3;
const IMAGE_COLUMN: usize = 12;

/// Which panels go into a shot list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShotFilter {
    #[default]
    All,
    Camera(String),
    Scene(String),
    Setup(String),
}

impl ShotFilter {
    pub fn matches(&self, panel: &Panel) -> bool {
        match self {
            Self::All => true,
            Self::Camera(camera) => panel.camera == *camera,
            Self::Scene(scene) => panel.scene_number == *scene,
            Self::Setup(setup) => panel.setup_number == *setup,
        }
    }
}

/// Panels passing `filter`, in shooting order
pub fn select<'a>(project: &'a Project, filter: &ShotFilter) -> Vec<&'a Panel> {
    let mut shots: Vec<&Panel> = project.panels().iter().filter(|p| filter.matches(p)).collect();
    // Stable, so ties keep storyboard order
    shots.sort_by(|a, b| compare_shots(a, b));
    shots
}

/// Scene, then setup, then shot number
pub fn compare_shots(a: &Panel, b: &Panel) -> Ordering {
    numbered_first(number(&a.scene_number), number(&b.scene_number))
        .then_with(|| numbered_first(number(&a.setup_number), number(&b.setup_number)))
        .then_with(|| a.shot_number.cmp(&b.shot_number))
}

fn number(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn numbered_first(a: Option<u64>, b: Option<u64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn camera_color(camera: &str) -> Option<Rgb> {
    CAMERA_COLORS.iter().find(|(name, _)| *name == camera).map(|(_, color)| *color)
}

/// Title printed on shot lists, e.g. "My Film - Shot List"
pub fn shot_list_title(project: &Project) -> String {
    let name = project.name().trim();
    if name.is_empty() {
        "Storyboard Shot List".to_string()
    } else {
        format!("{} - Shot List", name)
    }
}

/// Text of every column but the image
fn row_values(panel: &Panel) -> [String; 12] {
    let camera = if panel.camera_name.trim().is_empty() {
        panel.camera.clone()
    } else {
        format!("{}\n({})", panel.camera, panel.camera_name.trim())
    };
    [
        panel.scene_number.clone(),
        panel.shot_number.clone(),
        panel.setup_number.clone(),
        camera,
        panel.subject.clone(),
        panel.shot_time.clone(),
        panel.size.clone(),
        panel.movement.clone(),
        panel.lens.clone(),
        panel.description.clone(),
        panel.notes.clone(),
        panel.audio_notes.clone(),
    ]
}

/// Writes shot lists as PDF or XML
pub struct ShotListExporter {
    config: ExportConfig,
}

impl ShotListExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Write the shot list as a PDF table
    pub fn export_pdf(
        &self,
        project: &Project,
        filter: &ShotFilter,
        path: &Path,
        generated: DateTime<Utc>,
    ) -> Result<ExportSummary> {
        let shots = select(project, filter);
        info!("Exporting shot list of {} shots ({:?}) to {:?}", shots.len(), filter, path);
        let (bytes, pages) = self.render_pdf(project, &shots, generated)?;
        write_atomically(path, &bytes)?;
        Ok(summary(path, pages, &shots))
    }

    /// Write the shot list as XML
    pub fn export_xml(
        &self,
        project: &Project,
        filter: &ShotFilter,
        path: &Path,
        generated: DateTime<Utc>,
    ) -> Result<ExportSummary> {
        let shots = select(project, filter);
        info!("Exporting shot list of {} shots ({:?}) to {:?}", shots.len(), filter, path);
        let bytes = xml::shot_list(&shot_list_title(project), &shots, generated)?;
        write_atomically(path, &bytes)?;
        Ok(summary(path, 0, &shots))
    }

    /// Build the PDF bytes for already selected shots and report the page count
    pub fn render_pdf(&self, project: &Project, shots: &[&Panel], generated: DateTime<Utc>) -> Result<(Vec<u8>, usize)> {
        let (width, height) = self.config.page_dimensions();
        let margin = self.config.margin_pt();
        let footer = if self.config.page_numbers { FOOTER_BAND } else { 0.0 };
        let bottom = margin + footer;
        let table_w = width - 2.0 * margin;
        let title = shot_list_title(project);

        let pages = paginate(shots.len(), height - margin - INTRO_BAND - bottom, height - margin - bottom);
        let widths = column_widths(table_w);
        let mut writer = PdfWriter::new();

        for (page, rows) in pages.iter().enumerate() {
            let mut canvas = Canvas::new();
            let mut top = height - margin;
            if page == 0 {
                self.draw_intro(&mut canvas, &title, generated, margin, top, table_w);
                top -= INTRO_BAND;
            }

            top -= HEADING_ROW;
            let mut x = margin;
            for (i, (heading, _, _)) in COLUMNS.iter().enumerate() {
                let cell = Rect::new(x, top, widths[i], HEADING_ROW);
                canvas.fill_rect(cell, LIGHT_GREY);
                canvas.stroke_rect(cell, DARK_GREY, 0.5);
                canvas.text_centered(cell.x + cell.w / 2.0, cell.y + 6.5, BOLD, HEADING_SIZE, BLACK, heading);
                x += widths[i];
            }

            for panel in &shots[rows.clone()] {
                top -= SHOT_ROW;
                self.draw_row(&mut canvas, &mut writer, project, panel, margin, top, &widths);
            }

            if self.config.page_numbers {
                let footer = format!("Page {} of {}", page + 1, pages.len());
                canvas.text_centered(width / 2.0, margin + 4.0, REGULAR, FOOTER_SIZE, DARK_GREY, &footer);
            }
            writer.add_page(width, height, canvas)?;
        }

        let count = writer.page_count();
        Ok((writer.finish(&title)?, count))
    }

    fn draw_intro(&self, canvas: &mut Canvas, title: &str, generated: DateTime<Utc>, left: f32, top: f32, width: f32) {
        let title_line = fit_line(title, TITLE_SIZE, true, width);
        canvas.text(left, top - TITLE_SIZE, BOLD, TITLE_SIZE, BLACK, &title_line);
        let stamp = format!("Generated: {}", generated.format("%Y-%m-%d %H:%M"));
        canvas.text(left, top - TITLE_SIZE - 16.0, REGULAR, HEADING_SIZE, BLACK, &stamp);

        // Camera legend: swatch then name, left to right
        let legend_y = top - TITLE_SIZE - 36.0;
        let mut x = left;
        for (camera, color) in CAMERA_COLORS {
            canvas.fill_rect(Rect::new(x, legend_y, 10.0, 10.0), color);
            canvas.text(x + 14.0, legend_y + 2.0, REGULAR, CELL_SIZE, BLACK, camera);
            x += 72.0;
        }
        canvas.line((left, top - INTRO_BAND + 6.0), (left + width, top - INTRO_BAND + 6.0), LIGHT_GREY, 0.5);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_row(
        &self,
        canvas: &mut Canvas,
        writer: &mut PdfWriter,
        project: &Project,
        panel: &Panel,
        left: f32,
        y: f32,
        widths: &[f32],
    ) {
        debug!("Shot list row for {}", panel.display_name());
        let values = row_values(panel);
        let mut x = left;
        for (i, (_, _, centered)) in COLUMNS.iter().enumerate() {
            let cell = Rect::new(x, y, widths[i], SHOT_ROW);
            x += widths[i];

            let mut color = BLACK;
            if i == CAMERA_COLUMN {
                if let Some(fill) = camera_color(&panel.camera) {
                    canvas.fill_rect(cell, fill);
                    color = WHITE;
                }
            }
            canvas.stroke_rect(cell, DARK_GREY, 0.5);

            if i == IMAGE_COLUMN {
                self.draw_thumbnail(canvas, writer, project, panel, cell);
            } else {
                draw_cell_text(canvas, cell, &values[i], *centered, color);
            }
        }
    }

    fn draw_thumbnail(&self, canvas: &mut Canvas, writer: &mut PdfWriter, project: &Project, panel: &Panel, cell: Rect) {
        let location = match project.image_location(panel) {
            Some(path) if path.exists() => path,
            _ => {
                draw_cell_text(canvas, cell, "No Image", true, BLACK);
                return;
            }
        };
        match decode_image(&location, THUMBNAIL_PX) {
            Ok(pixels) => {
                let embedded = writer.add_image(&pixels);
                let target = fit_image(embedded.width, embedded.height, cell.inset(3.0));
                canvas.draw_image(&embedded, target);
            }
            Err(e) => {
                warn!("Shot list thumbnail for {}: {}", panel.display_name(), e);
                draw_cell_text(canvas, cell, "Image Error", true, BLACK);
            }
        }
    }
}

fn summary(path: &Path, pages: usize, shots: &[&Panel]) -> ExportSummary {
    ExportSummary {
        path: path.to_path_buf(),
        pages,
        panels: shots.len(),
        order: shots.iter().map(|p| p.id.clone()).collect(),
    }
}

/// Column widths scaled to fill the table width
fn column_widths(table_w: f32) -> Vec<f32> {
    let total: f32 = COLUMNS.iter().map(|(_, w, _)| w).sum();
    COLUMNS.iter().map(|(_, w, _)| w / total * table_w).collect()
}

/// Row ranges per page; the first page has less room because of the intro.
/// An empty list still gets one page with the heading row.
fn paginate(count: usize, first_height: f32, other_height: f32) -> Vec<Range<usize>> {
    let fit = |height: f32| (((height - HEADING_ROW) / SHOT_ROW).floor() as usize).max(1);
    let mut pages = Vec::new();
    let mut start = 0;
    loop {
        let rows = if pages.is_empty() { fit(first_height) } else { fit(other_height) };
        let end = (start + rows).min(count);
        pages.push(start..end);
        if end >= count {
            return pages;
        }
        start = end;
    }
}

fn draw_cell_text(canvas: &mut Canvas, cell: Rect, text: &str, centered: bool, color: Rgb) {
    let inner = cell.inset(2.0);
    let max_lines = (inner.h / CELL_LEADING) as usize;
    let mut lines = wrap_text(text, CELL_SIZE, inner.w, 0.0);
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            *last = fit_line(&format!("{}...", last), CELL_SIZE, false, inner.w);
        }
    }

    let block = lines.len() as f32 * CELL_LEADING;
    let mut baseline = cell.y + cell.h / 2.0 + block / 2.0 - CELL_SIZE;
    for line in lines {
        if centered {
            canvas.text_centered(inner.x + inner.w / 2.0, baseline, REGULAR, CELL_SIZE, color, &line);
        } else {
            canvas.text(inner.x, baseline, REGULAR, CELL_SIZE, color, &line);
        }
        baseline -= CELL_LEADING;
    }
}
