// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The TOC generation pipeline: ingest -> glyph check -> font resolve ->
// plan -> links -> assemble.
//
// Only the font fetch suspends; everything else is synchronous pure
// computation.  Cancellation is coarse: the flag is checked before font
// resolution and again (by the worker) before the result is posted, never
// inside pagination or assembly, so in-flight stage work always runs to
// completion.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, info};

use blattwerk_core::error::Result;
use blattwerk_core::types::{PageGeometry, TocOptions};
use blattwerk_document::{
    assemble, build_links, ingest, load_document, plan, requires_extended_glyphs,
};

use crate::fonts::FontResolver;
use crate::protocol::EngineNotice;
use crate::worker::EngineEvent;

/// Run the full pipeline for one request.
///
/// Returns `Ok(None)` when the job was cancelled at a stage boundary; the
/// caller suppresses delivery.  All other outcomes are the assembled bytes
/// or the error to surface.
pub async fn run(
    document_bytes: &[u8],
    options: &TocOptions,
    fonts: &FontResolver,
    cancelled: &AtomicBool,
    events: &mpsc::Sender<EngineEvent>,
) -> Result<Option<Vec<u8>>> {
    status(events, "reading document outline");
    let original = load_document(document_bytes)?;
    let entries = ingest(&original)?;

    let extended = requires_extended_glyphs(&entries, &options.title);
    debug!(entries = entries.len(), extended, "outline ready");

    if cancelled.load(Ordering::SeqCst) {
        info!("cancelled before font resolution");
        return Ok(None);
    }

    if extended {
        status(events, "resolving extended glyph coverage");
    }
    let font = fonts.resolve(extended, &options.font_family).await;
    if extended && !font.is_embedded() {
        status(
            events,
            "extended font unavailable; rendering with baseline glyph coverage",
        );
    }

    status(events, "planning table of contents pages");
    let plan = plan(
        &entries,
        PageGeometry::a4(),
        options.font_size as f32,
        &options.title,
    );
    let links = build_links(&plan);

    status(events, "assembling document");
    let output = assemble(original, &plan, &links, &entries, options, &font)?;

    Ok(Some(output))
}

/// Post an advisory status notice.  Best-effort: a caller that stopped
/// listening, or fell behind, must not stall the pipeline.
fn status(events: &mpsc::Sender<EngineEvent>, message: &str) {
    let _ = events.try_send(EngineEvent::Notice(EngineNotice::Status {
        message: message.to_string(),
    }));
}
