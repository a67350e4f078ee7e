// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use libfuzzer_sys::fuzz_target;
use storyboard::{AppConfig, Project};

fuzz_target!(|data: &[u8]| {
    let config = AppConfig::default();
    if let Ok(project) = Project::from_json_slice(data, &config) {
        // Anything that parses must serialize and parse back to the same panels
        let json = project.to_json().expect("serialize parsed project");
        let again = Project::from_json_slice(json.as_bytes(), &config).expect("reparse own output");
        assert_eq!(project.panels(), again.panels());
        for (i, panel) in again.panels().iter().enumerate() {
            assert_eq!(panel.order, i);
        }
    }
});
