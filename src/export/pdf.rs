// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Minimal PDF assembly on top of lopdf

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::layout::{text_width, Rect, Rgb};
use crate::{Result, StoryboardError};

/// Resource name of Helvetica
pub const REGULAR: &str = "F1";
/// Resource name of Helvetica-Bold
pub const BOLD: &str = "F2";

/// An image XObject already stored in the document
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub name: String,
    pub width: u32,
    pub height: u32,
    id: ObjectId,
}

/// Drawing operations for one page
#[derive(Default)]
pub struct Canvas {
    ops: Vec<Operation>,
    images: Vec<(String, ObjectId)>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(color_op("rg", color));
        self.ops.push(rect_op(rect));
        self.ops.push(Operation::new("f", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    pub fn stroke_rect(&mut self, rect: Rect, color: Rgb, line_width: f32) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(color_op("RG", color));
        self.ops.push(Operation::new("w", vec![line_width.into()]));
        self.ops.push(rect_op(rect));
        self.ops.push(Operation::new("S", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, line_width: f32) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(color_op("RG", color));
        self.ops.push(Operation::new("w", vec![line_width.into()]));
        self.ops.push(Operation::new("m", vec![from.0.into(), from.1.into()]));
        self.ops.push(Operation::new("l", vec![to.0.into(), to.1.into()]));
        self.ops.push(Operation::new("S", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    /// Text with its baseline starting at (x, y)
    pub fn text(&mut self, x: f32, y: f32, font: &str, size: f32, color: Rgb, text: &str) {
        if text.is_empty() {
            return;
        }
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
        self.ops.push(color_op("rg", color));
        self.ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.ops.push(Operation::new("Tj", vec![Object::string_literal(encode_text(text))]));
        self.ops.push(Operation::new("ET", vec![]));
    }

    pub fn text_right(&mut self, right: f32, y: f32, font: &str, size: f32, color: Rgb, text: &str) {
        let width = text_width(text, size, font == BOLD);
        self.text(right - width, y, font, size, color, text);
    }

    pub fn text_centered(&mut self, center: f32, y: f32, font: &str, size: f32, color: Rgb, text: &str) {
        let width = text_width(text, size, font == BOLD);
        self.text(center - width / 2.0, y, font, size, color, text);
    }

    pub fn draw_image(&mut self, image: &EmbeddedImage, rect: Rect) {
        if !self.images.iter().any(|(name, _)| *name == image.name) {
            self.images.push((image.name.clone(), image.id));
        }
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![rect.w.into(), 0.into(), 0.into(), rect.h.into(), rect.x.into(), rect.y.into()],
        ));
        self.ops.push(Operation::new("Do", vec![Object::Name(image.name.as_bytes().to_vec())]));
        self.ops.push(Operation::new("Q", vec![]));
    }
}

fn color_op(operator: &str, (r, g, b): Rgb) -> Operation {
    Operation::new(operator, vec![r.into(), g.into(), b.into()])
}

fn rect_op(rect: Rect) -> Operation {
    Operation::new("re", vec![rect.x.into(), rect.y.into(), rect.w.into(), rect.h.into()])
}

/// Map text onto WinAnsiEncoding; anything outside it becomes '?'
pub fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

/// Accumulates pages and images, then serializes the document
pub struct PdfWriter {
    doc: Document,
    pages_id: ObjectId,
    fonts_id: ObjectId,
    pages: Vec<ObjectId>,
    images: usize,
}

impl PdfWriter {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let fonts_id = doc.add_object(dictionary! {
            REGULAR => regular,
            BOLD => bold,
        });

        Self {
            doc,
            pages_id,
            fonts_id,
            pages: Vec::new(),
            images: 0,
        }
    }

    /// Store RGB pixels as an image XObject
    pub fn add_image(&mut self, rgb: &image::RgbImage) -> EmbeddedImage {
        self.images += 1;
        let name = format!("Im{}", self.images);
        let (width, height) = rgb.dimensions();
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            rgb.as_raw().clone(),
        );
        let id = self.doc.add_object(stream);
        EmbeddedImage { name, width, height, id }
    }

    pub fn add_page(&mut self, width: f32, height: f32, canvas: Canvas) -> Result<()> {
        let content = Content { operations: canvas.ops };
        let encoded = content
            .encode()
            .map_err(|e| StoryboardError::render(format!("cannot encode page content: {}", e)))?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, encoded));

        let mut xobjects = Dictionary::new();
        for (name, id) in canvas.images {
            xobjects.set(name.into_bytes(), id);
        }

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => self.fonts_id,
                "XObject" => xobjects,
            },
        });
        self.pages.push(page_id);
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Close the page tree and return the file bytes
    pub fn finish(mut self, title: &str) -> Result<Vec<u8>> {
        let kids: Vec<Object> = self.pages.iter().map(|id| (*id).into()).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.pages.len() as i64,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal(encode_text(title)),
            "Creator" => Object::string_literal("storyboard"),
            "Producer" => Object::string_literal(format!("storyboard {}", env!("CARGO_PKG_VERSION"))),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);
        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| StoryboardError::render(format!("cannot serialize PDF: {}", e)))?;
        Ok(bytes)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}
