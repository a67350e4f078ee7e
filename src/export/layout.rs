// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Page geometry and text measurement for the PDF exporter.
//!
//! All coordinates are PDF points with the origin at the bottom-left corner.

use crate::config::ExportConfig;

pub const TITLE_SIZE: f32 = 14.0;
pub const HEADER_SIZE: f32 = 10.0;
pub const LENS_SIZE: f32 = 9.0;
pub const BODY_SIZE: f32 = 8.0;
pub const BODY_LEADING: f32 = 10.0;
pub const FOOTER_SIZE: f32 = 8.0;

const TITLE_BAND: f32 = 28.0;
const FOOTER_BAND: f32 = 16.0;
const CELL_PADDING: f32 = 3.0;
const HEADER_HEIGHT: f32 = 14.0;
const TECH_LABEL_HEIGHT: f32 = 14.0;
const TECH_VALUE_HEIGHT: f32 = 17.0;
const TEXT_PADDING: f32 = 3.0;

pub type Rgb = (f32, f32, f32);

pub const BLACK: Rgb = (0.0, 0.0, 0.0);
pub const WHITE: Rgb = (1.0, 1.0, 1.0);
pub const LIGHT_GREY: Rgb = (0.827, 0.827, 0.827);
pub const DARK_GREY: Rgb = (0.663, 0.663, 0.663);

/// Header colours, picked by the first character of the shot label
const SHOT_COLORS: [Rgb; 7] = [
    (0.0, 0.0, 1.0),       // blue
    (1.0, 0.647, 0.0),     // orange
    (0.0, 0.502, 0.0),     // green
    (0.502, 0.0, 0.502),   // purple
    (1.0, 0.0, 0.0),       // red
    (0.647, 0.165, 0.165), // brown
    DARK_GREY,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn top(&self) -> f32 {
        self.y + self.h
    }

    pub fn inset(&self, by: f32) -> Self {
        Self::new(self.x + by, self.y + by, (self.w - 2.0 * by).max(0.0), (self.h - 2.0 * by).max(0.0))
    }

    /// Split off a band of `height` from the top; returns (band, rest)
    pub fn take_top(&self, height: f32) -> (Self, Self) {
        let height = height.min(self.h);
        let band = Self::new(self.x, self.top() - height, self.w, height);
        let rest = Self::new(self.x, self.y, self.w, self.h - height);
        (band, rest)
    }

    /// Split into `n` equal columns, left to right
    pub fn columns(&self, n: usize) -> Vec<Self> {
        let w = self.w / n as f32;
        (0..n).map(|i| Self::new(self.x + w * i as f32, self.y, w, self.h)).collect()
    }
}

/// Where things go on every page
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub title_baseline: (f32, f32),
    pub footer_baseline: (f32, f32),
    /// Panel cells in reading order: left to right, top to bottom
    pub cells: Vec<Rect>,
}

impl PageLayout {
    pub fn new(config: &ExportConfig) -> Self {
        let (width, height) = config.page_dimensions();
        let margin = config.margin_pt();
        let footer = if config.page_numbers { FOOTER_BAND } else { 0.0 };

        let area = Rect::new(
            margin,
            margin + footer,
            width - 2.0 * margin,
            height - 2.0 * margin - TITLE_BAND - footer,
        );

        let columns = config.columns.max(1);
        let rows = config.rows.max(1);
        let cell_w = area.w / columns as f32;
        let cell_h = area.h / rows as f32;

        let mut cells = Vec::with_capacity(config.panels_per_page());
        for row in 0..rows {
            for col in 0..columns {
                let x = area.x + cell_w * col as f32;
                let y = area.top() - cell_h * (row + 1) as f32;
                cells.push(Rect::new(x, y, cell_w, cell_h).inset(CELL_PADDING));
            }
        }

        Self {
            width,
            height,
            title_baseline: (margin, height - margin - TITLE_SIZE),
            footer_baseline: (width / 2.0, margin + 4.0),
            cells,
        }
    }

    pub fn panels_per_page(&self) -> usize {
        self.cells.len()
    }

    /// Pages needed for `panel_count` panels; an empty storyboard still gets one
    pub fn page_count(&self, panel_count: usize) -> usize {
        panel_count.div_ceil(self.panels_per_page()).max(1)
    }
}

/// The stacked areas of one panel cell, top to bottom
#[derive(Debug, Clone, Copy)]
pub struct PanelRegions {
    pub header: Rect,
    pub image: Rect,
    pub tech_labels: Rect,
    pub tech_values: Rect,
    pub text: Rect,
}

impl PanelRegions {
    pub fn new(cell: Rect) -> Self {
        let (header, rest) = cell.take_top(HEADER_HEIGHT);
        let (image, rest) = rest.take_top(cell.h * 0.5);
        let (tech_labels, rest) = rest.take_top(TECH_LABEL_HEIGHT);
        let (tech_values, rest) = rest.take_top(TECH_VALUE_HEIGHT);
        Self {
            header,
            image,
            tech_labels,
            tech_values,
            text: rest.inset(TEXT_PADDING),
        }
    }

    /// Lines of body text that fit under the technical table
    pub fn text_lines(&self) -> usize {
        if self.text.h < BODY_SIZE {
            0
        } else {
            1 + ((self.text.h - BODY_SIZE) / BODY_LEADING) as usize
        }
    }
}

/// Largest rectangle with the image's aspect ratio that fits `area`, centred
pub fn fit_image(width: u32, height: u32, area: Rect) -> Rect {
    if width == 0 || height == 0 || area.w <= 0.0 || area.h <= 0.0 {
        return Rect::new(area.x, area.y, 0.0, 0.0);
    }
    let aspect = width as f32 / height as f32;
    let mut w = area.w;
    let mut h = w / aspect;
    if h > area.h {
        h = area.h;
        w = h * aspect;
    }
    Rect::new(area.x + (area.w - w) / 2.0, area.y + (area.h - h) / 2.0, w, h)
}

pub fn shot_color(label: &str) -> Rgb {
    let first = label.chars().next().map(|c| c as usize).unwrap_or(0);
    SHOT_COLORS[first % SHOT_COLORS.len()]
}

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :;<=>?@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [\]^_`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {|}~
];

/// Helvetica-Bold runs roughly this much wider than the regular face
const BOLD_FACTOR: f32 = 1.06;

pub fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| {
            let code = c as u32;
            if (32..=126).contains(&code) {
                HELVETICA_WIDTHS[(code - 32) as usize] as u32
            } else {
                556
            }
        })
        .sum();
    let width = units as f32 * size / 1000.0;
    if bold { width * BOLD_FACTOR } else { width }
}

/// Shorten `text` with "..." until it fits `max_width`
pub fn fit_line(text: &str, size: f32, bold: bool, max_width: f32) -> String {
    if text_width(text, size, bold) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate = format!("{}...", chars.iter().collect::<String>().trim_end());
        if text_width(&candidate, size, bold) <= max_width {
            return candidate;
        }
    }
    String::new()
}

/// Greedy word wrap; words wider than a line are broken by character.
/// `first_indent` reserves room on the first line for a label.
pub fn wrap_text(text: &str, size: f32, max_width: f32, first_indent: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut limit = max_width - first_indent;

    for paragraph in text.lines() {
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if text_width(&candidate, size, false) <= limit {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                limit = max_width;
                if text_width(word, size, false) <= limit {
                    current = word.to_string();
                    continue;
                }
            }
            for c in word.chars() {
                current.push(c);
                if text_width(&current, size, false) > limit && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    limit = max_width;
                    current.push(c);
                }
            }
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            limit = max_width;
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_one_row_of_four() {
        let layout = PageLayout::new(&ExportConfig::default());
        assert_eq!(layout.panels_per_page(), 4);
        let first = layout.cells[0];
        for cell in &layout.cells[1..] {
            assert!((cell.y - first.y).abs() < 0.01);
            assert!(cell.x > first.x);
        }
        for cell in &layout.cells {
            assert!(cell.x >= 0.0 && cell.x + cell.w <= layout.width);
            assert!(cell.y >= 0.0 && cell.top() <= layout.height);
        }
    }

    #[test]
    fn test_cells_read_left_to_right_top_to_bottom() {
        let config = ExportConfig { columns: 2, rows: 2, ..ExportConfig::default() };
        let cells = PageLayout::new(&config).cells;
        assert_eq!(cells.len(), 4);
        assert!(cells[1].x > cells[0].x);
        assert!((cells[0].y - cells[1].y).abs() < 0.01);
        assert!(cells[2].y < cells[0].y);
        assert!((cells[2].x - cells[0].x).abs() < 0.01);
    }

    #[test]
    fn test_page_count() {
        let layout = PageLayout::new(&ExportConfig::default());
        assert_eq!(layout.page_count(0), 1);
        assert_eq!(layout.page_count(4), 1);
        assert_eq!(layout.page_count(5), 2);
        assert_eq!(layout.page_count(9), 3);
    }

    #[test]
    fn test_regions_stack_inside_cell() {
        let cell = Rect::new(10.0, 10.0, 190.0, 400.0);
        let regions = PanelRegions::new(cell);
        assert!((regions.header.top() - cell.top()).abs() < 0.01);
        assert!((regions.image.top() - regions.header.y).abs() < 0.01);
        assert!((regions.image.h - 200.0).abs() < 0.01);
        assert!(regions.text.y >= cell.y);
        assert!(regions.text_lines() > 5);
    }

    #[test]
    fn test_fit_image_keeps_aspect_ratio() {
        let area = Rect::new(0.0, 0.0, 200.0, 100.0);
        let wide = fit_image(1600, 400, area);
        assert!((wide.w - 200.0).abs() < 0.01);
        assert!((wide.h - 50.0).abs() < 0.01);
        assert!((wide.y - 25.0).abs() < 0.01);

        let tall = fit_image(300, 600, area);
        assert!((tall.h - 100.0).abs() < 0.01);
        assert!((tall.w - 50.0).abs() < 0.01);
        assert!((tall.x - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_shot_color_is_deterministic() {
        assert_eq!(shot_color("12"), shot_color("1A"));
        assert_eq!(shot_color(""), SHOT_COLORS[0]);
    }

    #[test]
    fn test_text_width() {
        assert!((text_width("ii", 10.0, false) - 4.44).abs() < 0.01);
        assert!(text_width("WIDE", 8.0, true) > text_width("WIDE", 8.0, false));
    }

    #[test]
    fn test_fit_line_truncates() {
        let line = fit_line("STICKS or GIMBAL on a long rig", BODY_SIZE, false, 40.0);
        assert!(line.ends_with("..."));
        assert!(text_width(&line, BODY_SIZE, false) <= 40.0);
        assert_eq!(fit_line("OTS", BODY_SIZE, false, 40.0), "OTS");
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("The hero walks slowly toward the window and looks out", BODY_SIZE, 80.0, 0.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, BODY_SIZE, false) <= 80.0);
        }
        assert_eq!(lines.join(" "), "The hero walks slowly toward the window and looks out");
    }

    #[test]
    fn test_wrap_breaks_long_words_and_paragraphs() {
        let lines = wrap_text("AAAAAAAAAAAAAAAAAAAAAAAA\nshort", BODY_SIZE, 40.0, 0.0);
        assert!(lines.len() >= 3);
        assert_eq!(lines.last().map(String::as_str), Some("short"));
        assert!(wrap_text("   ", BODY_SIZE, 40.0, 0.0).is_empty());
    }
}
