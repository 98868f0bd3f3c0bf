// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF synthesis and assembly: rendering of new TOC pages and surgery on
// the original document.

pub mod assemble;
pub mod render;

use blattwerk_core::error::{BlattwerkError, Result};
use lopdf::Document;

/// Load a document from raw bytes already in memory.
pub fn load_document(bytes: &[u8]) -> Result<Document> {
    Document::load_mem(bytes)
        .map_err(|err| BlattwerkError::PdfError(format!("failed to load document: {err}")))
}
