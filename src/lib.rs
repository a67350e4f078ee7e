// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Storyboard: film storyboards as ordered shot panels.
//!
//! A [`Project`] holds panels (an image plus shot metadata) in display order,
//! persists them to a project directory and is rendered to PDF by the
//! [`Exporter`]. A [`ShotListExporter`] writes the same panels as a shot list
//! table, in PDF or XML.

pub mod config;
pub mod error;
pub mod export;
pub mod panel;
pub mod project;

pub use config::AppConfig;
pub use error::{Result, StoryboardError};
pub use export::shot_list::{ShotFilter, ShotListExporter};
pub use export::{ExportSummary, Exporter};
pub use panel::{Panel, PanelData};
pub use project::Project;
