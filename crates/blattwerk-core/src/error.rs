// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Blattwerk.

use thiserror::Error;

/// Top-level error type for all Blattwerk operations.
#[derive(Debug, Error)]
pub enum BlattwerkError {
    // -- Outline errors --
    /// The source document carries no outline entries.  Terminal and
    /// user-facing: without an outline there is nothing to list.
    #[error("document has no outline entries to build a table of contents from")]
    NoOutline,

    // -- Font errors --
    /// An extended-coverage font could not be fetched or validated.
    /// Recovered inside the resolver by degrading to the baseline font;
    /// this variant never escapes to a caller-facing response.
    #[error("extended font load failed: {0}")]
    FontLoad(String),

    // -- Assembly errors --
    /// The serialized output document was empty.  A zero-length result is
    /// indistinguishable from total corruption and is never returned as
    /// success.
    #[error("assembled document serialized to zero bytes")]
    RenderIntegrity,

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Engine errors --
    #[error("engine error: {0}")]
    Engine(String),

    // -- Ambient --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BlattwerkError>;
