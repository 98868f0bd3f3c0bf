// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Blattwerk TOC synthesis engine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a TOC generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One navigable entry read from a document outline.
///
/// Immutable once ingested; document order of the containing sequence is
/// semantically load-bearing (it defines listing and pagination order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Nesting depth, 1 = top level.
    pub level: u32,
    /// Entry title as decoded text.
    pub title: String,
    /// 1-based page index into the original document.
    pub target_page: u32,
}

/// Page geometry for synthesized TOC pages, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    /// A4 portrait with a one-inch margin, the default for synthesized
    /// front matter.
    pub fn a4() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
            margin: 72.0,
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

/// Axis-aligned rectangle in top-down page coordinates (y grows downward
/// from the page top; converted to PDF bottom-up coordinates at render and
/// annotation time).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Baseline font families guaranteed renderable without any font payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaselineFamily {
    Helvetica,
    TimesRoman,
    Courier,
}

impl BaselineFamily {
    /// Map a caller-supplied family name onto a baseline family.
    /// Unknown names fall back to Helvetica.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("times") {
            Self::TimesRoman
        } else if lower.contains("courier") || lower.contains("mono") {
            Self::Courier
        } else {
            Self::Helvetica
        }
    }
}

/// A resolved font: either a baseline family identifier (no payload) or an
/// extended-coverage font binary fetched at runtime.
///
/// The embedded payload is Arc-shared so the process-wide cache and every
/// in-flight job can hold it without copying megabytes of font data.
#[derive(Debug, Clone)]
pub enum FontHandle {
    Builtin(BaselineFamily),
    Embedded(Arc<Vec<u8>>),
}

impl FontHandle {
    /// Whether this handle carries an extended-coverage payload.
    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded(_))
    }
}

/// Per-request TOC options.  All parameters arrive per-request; there is
/// no persisted configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocOptions {
    /// Heading text rendered at the top of the first TOC page.
    pub title: String,
    /// Entry font size in points.
    pub font_size: u32,
    /// Requested baseline family; ignored when extended glyph coverage is
    /// required.
    pub font_family: String,
    /// Whether to rewrite the document outline to include the TOC itself.
    pub add_bookmark: bool,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            title: "Table of Contents".into(),
            font_size: 12,
            font_family: "Helvetica".into(),
            add_bookmark: false,
        }
    }
}
