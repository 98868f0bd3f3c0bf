// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// blattwerk-engine — Font resolution, the TOC generation pipeline, and the
// FIFO job worker.  This crate bridges between the pure document
// processing in `blattwerk-document` and the message-passing boundary a
// caller reaches the engine through.

pub mod fonts;
pub mod pipeline;
pub mod protocol;
pub mod worker;

pub use fonts::{FontResolver, FontSource};
pub use protocol::{EngineCommand, EngineNotice, EngineResponse};
pub use worker::{EngineEvent, JobHandle, TocEngine};
