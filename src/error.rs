// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for storyboard projects

use thiserror::Error;

/// Result type alias for storyboard operations
pub type Result<T> = std::result::Result<T, StoryboardError>;

/// Storyboard error types
#[derive(Error, Debug)]
pub enum StoryboardError {
    #[error("Invalid panel data: {0}")]
    Validation(String),

    #[error("No panel at position {position} (project has {len} panels)")]
    NotFound { position: usize, len: usize },

    #[error("Position {from} -> {to} is out of range: project has {len} panels")]
    Range { from: usize, to: usize, len: usize },

    #[error("Invalid project file: {0}")]
    Format(String),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoryboardError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}
