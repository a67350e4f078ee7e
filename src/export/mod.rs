// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! PDF export of a storyboard.
//!
//! Panels are laid out in project order on a fixed grid (columns × rows per
//! page). Each cell shows a coloured shot header, the image or a placeholder,
//! the SIZE / TYPE / MOVE / EQUIP table and the action and description text.

pub mod layout;
pub mod pdf;
pub mod shot_list;
pub mod xml;

use image::GenericImageView;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::ExportConfig;
use crate::panel::Panel;
use crate::project::Project;
use crate::{Result, StoryboardError};
use layout::{
    fit_image, fit_line, shot_color, text_width, wrap_text, PageLayout, PanelRegions, Rect, Rgb, BLACK,
    BODY_LEADING, BODY_SIZE, DARK_GREY, FOOTER_SIZE, HEADER_SIZE, LENS_SIZE, LIGHT_GREY, TITLE_SIZE, WHITE,
};
use pdf::{Canvas, PdfWriter, BOLD, REGULAR};

const TECH_LABELS: [&str; 4] = ["SIZE", "TYPE", "MOVE", "EQUIP"];

/// What an export produced
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub pages: usize,
    pub panels: usize,
    /// Panel ids in the order they were laid out
    pub order: Vec<String>,
}

/// Renders projects to PDF
pub struct Exporter {
    config: ExportConfig,
}

struct TextLine {
    label: Option<&'static str>,
    text: String,
    color: Rgb,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Render `project` and write it to `path`.
    ///
    /// The document is built in memory first; the file only appears once it
    /// has been written completely.
    pub fn export(&self, project: &Project, path: &Path) -> Result<ExportSummary> {
        info!("Exporting '{}' ({} panels) to {:?}", project.name(), project.len(), path);
        let (bytes, pages) = self.render(project)?;
        write_atomically(path, &bytes)?;

        let summary = ExportSummary {
            path: path.to_path_buf(),
            pages,
            panels: project.len(),
            order: project.panels().iter().map(|p| p.id.clone()).collect(),
        };
        info!("Wrote {} pages ({} bytes) to {:?}", pages, bytes.len(), path);
        Ok(summary)
    }

    /// Build the PDF bytes and report the page count
    pub fn render(&self, project: &Project) -> Result<(Vec<u8>, usize)> {
        let layout = PageLayout::new(&self.config);
        let per_page = layout.panels_per_page();
        let total = layout.page_count(project.len());
        let title = if project.name().trim().is_empty() { "Storyboard" } else { project.name() };

        let mut writer = PdfWriter::new();
        for page in 0..total {
            let mut canvas = Canvas::new();
            let (tx, ty) = layout.title_baseline;
            let title_line = fit_line(title, TITLE_SIZE, true, layout.width - 2.0 * tx);
            canvas.text(tx, ty, BOLD, TITLE_SIZE, BLACK, &title_line);

            if !project.is_empty() {
                for (slot, cell) in layout.cells.iter().enumerate() {
                    match project.panel(page * per_page + slot) {
                        Some(panel) => self.draw_panel(&mut canvas, &mut writer, project, panel, *cell)?,
                        None => canvas.stroke_rect(*cell, LIGHT_GREY, 0.5),
                    }
                }
            }

            if self.config.page_numbers {
                let (fx, fy) = layout.footer_baseline;
                let footer = format!("Page {} of {}", page + 1, total);
                canvas.text_centered(fx, fy, REGULAR, FOOTER_SIZE, DARK_GREY, &footer);
            }

            writer.add_page(layout.width, layout.height, canvas)?;
        }

        let pages = writer.page_count();
        Ok((writer.finish(title)?, pages))
    }

    fn draw_panel(
        &self,
        canvas: &mut Canvas,
        writer: &mut PdfWriter,
        project: &Project,
        panel: &Panel,
        cell: Rect,
    ) -> Result<()> {
        debug!("Laying out {} at {:?}", panel.display_name(), cell);
        let regions = PanelRegions::new(cell);

        // Header: "<shot> - <camera>" on a coloured block, lens on the right
        let halves = regions.header.columns(2);
        let label = panel.shot_label();
        canvas.fill_rect(halves[0], shot_color(&label));
        let baseline = regions.header.y + (regions.header.h - HEADER_SIZE) / 2.0 + 2.0;
        let heading = fit_line(&format!("{} - {}", label, panel.camera), HEADER_SIZE, true, halves[0].w - 8.0);
        canvas.text(halves[0].x + 4.0, baseline, BOLD, HEADER_SIZE, WHITE, &heading);
        let lens = fit_line(&panel.lens, LENS_SIZE, false, halves[1].w - 8.0);
        canvas.text_right(halves[1].x + halves[1].w - 4.0, baseline, REGULAR, LENS_SIZE, BLACK, &lens);

        self.draw_image(canvas, writer, project, panel, regions.image)?;

        // Technical table
        canvas.fill_rect(regions.tech_labels, LIGHT_GREY);
        let values = [&panel.size, &panel.shot_type, &panel.movement, &panel.equipment];
        let label_cells = regions.tech_labels.columns(4);
        let value_cells = regions.tech_values.columns(4);
        for i in 0..4 {
            let (lc, vc) = (label_cells[i], value_cells[i]);
            canvas.stroke_rect(lc, LIGHT_GREY, 0.5);
            canvas.stroke_rect(vc, LIGHT_GREY, 0.5);
            canvas.text_centered(lc.x + lc.w / 2.0, lc.y + 4.0, BOLD, BODY_SIZE, BLACK, TECH_LABELS[i]);
            let value = fit_line(values[i], BODY_SIZE, false, vc.w - 4.0);
            canvas.text_centered(vc.x + vc.w / 2.0, vc.y + 5.5, REGULAR, BODY_SIZE, BLACK, &value);
        }

        self.draw_text_block(canvas, panel, regions);
        canvas.stroke_rect(cell, BLACK, 0.5);
        Ok(())
    }

    fn draw_image(
        &self,
        canvas: &mut Canvas,
        writer: &mut PdfWriter,
        project: &Project,
        panel: &Panel,
        area: Rect,
    ) -> Result<()> {
        let location = match project.image_location(panel) {
            Some(path) if path.exists() => path,
            Some(path) => {
                warn!("Image for {} not found at {:?}, drawing placeholder", panel.display_name(), path);
                draw_placeholder(canvas, area);
                return Ok(());
            }
            None => {
                draw_placeholder(canvas, area);
                return Ok(());
            }
        };

        let pixels = self.load_image(&location)?;
        let embedded = writer.add_image(&pixels);
        let target = fit_image(embedded.width, embedded.height, area.inset(2.0));
        canvas.draw_image(&embedded, target);
        Ok(())
    }

    fn load_image(&self, path: &Path) -> Result<image::RgbImage> {
        decode_image(path, self.config.image_max_px)
    }

    fn draw_text_block(&self, canvas: &mut Canvas, panel: &Panel, regions: PanelRegions) {
        let area = regions.text;
        let mut lines = Vec::new();
        let mut labelled = |label: &'static str, text: &str| {
            let indent = text_width(&format!("{} ", label), BODY_SIZE, true);
            for (i, text) in wrap_text(text, BODY_SIZE, area.w, indent).into_iter().enumerate() {
                lines.push(TextLine { label: (i == 0).then_some(label), text, color: BLACK });
            }
        };

        if !panel.action.is_empty() {
            labelled("ACTION:", panel.action.as_str());
            let bgd = match (panel.background, panel.bgd_notes.trim()) {
                (true, "") => "Yes".to_string(),
                (true, notes) => format!("Yes - {}", notes),
                (false, _) => "No".to_string(),
            };
            labelled("BGD:", bgd.as_str());
        }
        for (label, value) in [
            ("SUBJECT:", &panel.subject),
            ("H/M/W:", &panel.hair_makeup),
            ("PROPS:", &panel.props),
            ("VFX:", &panel.vfx),
        ] {
            if !value.trim().is_empty() {
                labelled(label, value.as_str());
            }
        }
        for text in wrap_text(&panel.description, BODY_SIZE, area.w, 0.0) {
            lines.push(TextLine { label: None, text, color: DARK_GREY });
        }

        let max_lines = regions.text_lines();
        if lines.len() > max_lines {
            lines.truncate(max_lines);
            if let Some(last) = lines.last_mut() {
                let used = last
                    .label
                    .map(|l| text_width(&format!("{} ", l), BODY_SIZE, true))
                    .unwrap_or(0.0);
                last.text = fit_line(&format!("{}...", last.text), BODY_SIZE, false, area.w - used);
            }
        }

        let mut y = area.top() - BODY_SIZE;
        for line in lines {
            let mut x = area.x;
            if let Some(label) = line.label {
                canvas.text(x, y, BOLD, BODY_SIZE, BLACK, label);
                x += text_width(&format!("{} ", label), BODY_SIZE, true);
            }
            canvas.text(x, y, REGULAR, BODY_SIZE, line.color, &line.text);
            y -= BODY_LEADING;
        }
    }
}

/// Decode an image and shrink it so its longest side is at most `max_px`
pub(crate) fn decode_image(path: &Path, max_px: u32) -> Result<image::RgbImage> {
    let img = image::open(path).map_err(|e| {
        StoryboardError::render(format!("cannot decode image {}: {}", path.display(), e))
    })?;
    let (width, height) = img.dimensions();
    let img = if width > max_px || height > max_px {
        debug!("Downscaling {:?} from {}x{}", path, width, height);
        img.resize(max_px, max_px, image::imageops::FilterType::Triangle)
    } else {
        img
    };
    Ok(img.to_rgb8())
}

fn draw_placeholder(canvas: &mut Canvas, area: Rect) {
    canvas.stroke_rect(area, LIGHT_GREY, 0.5);
    let baseline = area.y + area.h / 2.0 - BODY_SIZE / 2.0;
    canvas.text_centered(area.x + area.w / 2.0, baseline, REGULAR, BODY_SIZE + 2.0, LIGHT_GREY, "No Image");
}

/// Write through a hidden sibling file so a failed export leaves nothing behind
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path.file_name().ok_or_else(|| {
        StoryboardError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a file path", path.display()),
        ))
    })?;
    let tmp = path.with_file_name(format!(".{}.partial", file_name.to_string_lossy()));

    let result = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
