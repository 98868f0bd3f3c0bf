// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extended-glyph font resolution.
//
// The engine ships no font files.  When a run needs glyph coverage beyond
// printable ASCII it fetches a single CJK-capable Noto font from an
// ordered list of candidate mirrors, validates the payload, and caches it
// for the lifetime of the process.  Total failure degrades to the baseline
// font instead of failing the request: visually worse, never fatal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::{BaselineFamily, FontHandle};

/// Per-source fetch timeout.
pub const FONT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum acceptable payload size.  A real extended-coverage font is
/// megabytes; anything under this floor is a redirect or error page
/// masquerading as success.
pub const MIN_FONT_PAYLOAD_BYTES: usize = 256 * 1024;

/// One candidate mirror for the extended-coverage font.
#[derive(Debug, Clone)]
pub struct FontSource {
    pub name: &'static str,
    pub url: &'static str,
}

/// Candidate mirrors, tried in order.  The first valid payload wins.
fn default_sources() -> Vec<FontSource> {
    vec![
        FontSource {
            name: "noto-cjk-jsdelivr",
            url: "https://cdn.jsdelivr.net/gh/googlefonts/noto-cjk@main/Sans/OTF/SimplifiedChinese/NotoSansCJKsc-Regular.otf",
        },
        FontSource {
            name: "noto-cjk-github",
            url: "https://raw.githubusercontent.com/googlefonts/noto-cjk/main/Sans/OTF/SimplifiedChinese/NotoSansCJKsc-Regular.otf",
        },
    ]
}

/// Resolves the font a run will render with.
///
/// Process-wide: one resolver is shared by every job in the execution
/// context.  The payload cache is mutated at most once per process
/// lifetime (on the first successful fetch) and the async mutex doubles
/// as the single-flight guard: it is held across the fetch, so concurrent
/// callers queue behind the one outstanding attempt and then observe the
/// populated cache instead of re-fetching.
pub struct FontResolver {
    client: reqwest::Client,
    sources: Vec<FontSource>,
    cache: Mutex<Option<Arc<Vec<u8>>>>,
}

impl FontResolver {
    pub fn new() -> Self {
        Self::with_sources(default_sources())
    }

    /// Resolver with an explicit candidate list (tests use this to keep
    /// the network out of the loop).
    pub fn with_sources(sources: Vec<FontSource>) -> Self {
        Self {
            client: reqwest::Client::new(),
            sources,
            cache: Mutex::new(None),
        }
    }

    /// Resolve a font for one run.
    ///
    /// Without extended-glyph needs this returns the requested baseline
    /// family immediately, no I/O.  With them it serves the cached payload
    /// or walks the candidate list; if every source fails it falls back to
    /// the baseline family (a failure is not cached, so a later request
    /// retries the sources).
    #[instrument(skip(self))]
    pub async fn resolve(&self, requires_extended: bool, family: &str) -> FontHandle {
        let baseline = FontHandle::Builtin(BaselineFamily::from_name(family));
        if !requires_extended {
            return baseline;
        }

        let mut cache = self.cache.lock().await;
        if let Some(payload) = cache.as_ref() {
            debug!(bytes = payload.len(), "extended font served from cache");
            return FontHandle::Embedded(Arc::clone(payload));
        }

        for source in &self.sources {
            match self.fetch_source(source).await {
                Ok(payload) => {
                    info!(
                        source = source.name,
                        bytes = payload.len(),
                        "extended font fetched"
                    );
                    let payload = Arc::new(payload);
                    *cache = Some(Arc::clone(&payload));
                    return FontHandle::Embedded(payload);
                }
                Err(err) => {
                    warn!(source = source.name, error = %err, "font source failed; trying next");
                }
            }
        }

        warn!("all extended font sources failed; degrading to baseline glyph coverage");
        baseline
    }

    /// Fetch and validate one candidate source.
    async fn fetch_source(&self, source: &FontSource) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(source.url)
            .timeout(FONT_FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|err| BlattwerkError::FontLoad(format!("{}: {err}", source.name)))?;

        if !response.status().is_success() {
            return Err(BlattwerkError::FontLoad(format!(
                "{}: HTTP {}",
                source.name,
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| BlattwerkError::FontLoad(format!("{}: {err}", source.name)))?;

        validate_payload(source.name, body.len())?;
        Ok(body.to_vec())
    }

    /// Seed the cache directly (tests).
    #[cfg(test)]
    pub(crate) async fn prime_cache(&self, payload: Vec<u8>) {
        *self.cache.lock().await = Some(Arc::new(payload));
    }
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Enforce the minimum-payload floor.
fn validate_payload(name: &str, len: usize) -> Result<()> {
    if len < MIN_FONT_PAYLOAD_BYTES {
        return Err(BlattwerkError::FontLoad(format!(
            "{name}: payload of {len} bytes is below the {MIN_FONT_PAYLOAD_BYTES} byte floor"
        )));
    }
    Ok(())
}
