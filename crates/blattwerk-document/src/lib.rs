// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// blattwerk-document — Document processing for the Blattwerk TOC engine.
//
// Provides outline ingestion (bookmark tree walk, destination resolution,
// title decoding), two-pass TOC pagination planning, link-graph
// construction, and document assembly (page prepending, link annotations,
// outline rewriting, serialization).

pub mod layout;
pub mod links;
pub mod outline;
pub mod pdf;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export the primary entry points so callers can use
// `blattwerk_document::plan` etc.
pub use layout::{PaginationPlan, PlacedEntry, plan};
pub use links::{LinkRecord, build_links};
pub use outline::{ingest, requires_extended_glyphs};
pub use pdf::assemble::assemble;
pub use pdf::load_document;
