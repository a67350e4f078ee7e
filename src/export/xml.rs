// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Shot list XML

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::panel::Panel;
use crate::{Result, StoryboardError};

fn xml_error(e: impl std::fmt::Display) -> StoryboardError {
    StoryboardError::render(format!("cannot write XML: {}", e))
}

struct ShotWriter {
    inner: Writer<Vec<u8>>,
}

impl ShotWriter {
    fn open(&mut self, name: &str) -> Result<()> {
        self.inner.write_event(Event::Start(BytesStart::new(name))).map_err(xml_error)
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.inner.write_event(Event::End(BytesEnd::new(name))).map_err(xml_error)
    }

    fn field(&mut self, name: &str, value: &str) -> Result<()> {
        self.inner
            .create_element(name)
            .write_text_content(BytesText::new(value))
            .map_err(xml_error)?;
        Ok(())
    }

    /// Written only when there is something to say
    fn optional(&mut self, name: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Ok(());
        }
        self.field(name, value)
    }
}

/// Serialize already selected and sorted shots
pub fn shot_list(title: &str, shots: &[&Panel], generated: DateTime<Utc>) -> Result<Vec<u8>> {
    let mut w = ShotWriter { inner: Writer::new_with_indent(Vec::new(), b' ', 2) };
    w.inner
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;

    w.open("ShotList")?;
    w.open("Metadata")?;
    w.field("Project", title)?;
    w.field("GeneratedDate", &generated.format("%Y-%m-%d %H:%M").to_string())?;
    w.close("Metadata")?;

    w.open("Shots")?;
    for panel in shots {
        w.open("Shot")?;
        w.field("Scene", &panel.scene_number)?;
        w.field("ShotNumber", &panel.shot_number)?;
        w.field("Setup", &panel.setup_number)?;
        w.field("Camera", &panel.camera)?;
        w.optional("CameraName", &panel.camera_name)?;

        w.open("Technical")?;
        w.field("Size", &panel.size)?;
        w.field("Move", &panel.movement)?;
        w.field("Equipment", &panel.equipment)?;
        w.field("Lens", &panel.lens)?;
        w.close("Technical")?;

        w.optional("Subject", &panel.subject)?;
        w.optional("Time", &panel.shot_time)?;
        w.optional("Description", &panel.description)?;
        w.optional("Notes", &panel.notes)?;
        w.optional("Audio", &panel.audio_notes)?;
        if panel.background {
            w.field("Background", &panel.bgd_notes)?;
        }
        w.optional("HairMakeup", &panel.hair_makeup)?;
        w.optional("Props", &panel.props)?;
        w.optional("VFX", &panel.vfx)?;
        if let Some(name) = panel.image_path.as_ref().and_then(|p| p.file_name()) {
            w.field("ImagePath", &name.to_string_lossy())?;
        }
        w.close("Shot")?;
    }
    w.close("Shots")?;
    w.close("ShotList")?;

    let mut bytes = w.inner.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelDefaults;
    use chrono::TimeZone;
    use quick_xml::Reader;

    fn generated() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
    }

    /// Text of every element, in document order
    fn texts(xml: &[u8]) -> Vec<(String, String)> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();
        let mut open = Vec::new();
        let mut found = Vec::new();
        loop {
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Start(e) => open.push(String::from_utf8(e.name().as_ref().to_vec()).unwrap()),
                Event::End(_) => {
                    open.pop();
                }
                Event::Text(t) => {
                    let name = open.last().cloned().unwrap_or_default();
                    found.push((name, t.unescape().unwrap().into_owned()));
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        found
    }

    #[test]
    fn test_shot_elements() {
        let mut panel = Panel::new(&PanelDefaults::default());
        panel.scene_number = "3".to_string();
        panel.shot_number = "B".to_string();
        panel.camera_name = "fx30".to_string();
        panel.background = true;
        panel.bgd_notes = "market crowd".to_string();
        panel.props = "bike & basket".to_string();
        panel.image_path = Some("images/abc_frame.png".into());

        let bytes = shot_list("Rain - Shot List", &[&panel], generated()).unwrap();
        let xml = String::from_utf8(bytes.clone()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("bike &amp; basket"));
        assert!(!xml.contains("<Subject>"));

        let found = texts(&bytes);
        let get = |name: &str| found.iter().find(|(n, _)| n == name).map(|(_, t)| t.as_str());
        assert_eq!(get("Project"), Some("Rain - Shot List"));
        assert_eq!(get("GeneratedDate"), Some("2025-03-14 09:30"));
        assert_eq!(get("Scene"), Some("3"));
        assert_eq!(get("CameraName"), Some("fx30"));
        assert_eq!(get("Move"), Some("STATIC"));
        assert_eq!(get("Background"), Some("market crowd"));
        assert_eq!(get("Props"), Some("bike & basket"));
        assert_eq!(get("ImagePath"), Some("abc_frame.png"));
    }

    #[test]
    fn test_empty_list() {
        let bytes = shot_list("Empty", &[], generated()).unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.contains("<Shots>"));
        assert!(!xml.contains("<Shot>"));
    }
}
