// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire types for the engine boundary.
//
// The engine is reached through a message-passing transport owned by the
// caller; these types pin the JSON shapes on that boundary: one command,
// one terminal response, zero or more advisory status notices.

use blattwerk_core::types::TocOptions;
use serde::{Deserialize, Serialize};

/// A command sent to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum EngineCommand {
    /// Generate TOC front matter for the supplied document.
    #[serde(rename_all = "camelCase")]
    GenerateToc {
        document_bytes: Vec<u8>,
        title: String,
        font_size: u32,
        /// Ignored when extended glyph coverage is required.
        font_family: String,
        add_bookmark: bool,
    },
}

impl EngineCommand {
    /// The per-request options carried by this command.
    pub fn options(&self) -> TocOptions {
        match self {
            Self::GenerateToc {
                title,
                font_size,
                font_family,
                add_bookmark,
                ..
            } => TocOptions {
                title: title.clone(),
                font_size: *font_size,
                font_family: font_family.clone(),
                add_bookmark: *add_bookmark,
            },
        }
    }
}

/// The terminal response for a command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EngineResponse {
    #[serde(rename_all = "camelCase")]
    Success { document_bytes: Vec<u8> },
    Error { message: String },
}

/// Advisory progress text.  Not part of the contract's correctness
/// surface; callers may ignore these entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EngineNotice {
    Status { message: String },
}
