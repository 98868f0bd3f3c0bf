// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Two-pass TOC pagination planner.
//
// Pass 1 walks the outline and only counts pages; pass 2 re-runs the
// identical walk and records placements.  The split exists because every
// entry's adjusted target page depends on the total TOC page count, which
// is unknown until the whole outline has been walked once.  Both passes
// drive the same cursor so the break rule cannot drift between them.
//
// Layout policy (indent, line height, title leading, number gutter) is
// fixed; only the font size is a per-request input.

use blattwerk_core::types::{OutlineEntry, PageGeometry, Rect};
use serde::Serialize;
use tracing::debug;

/// Horizontal indent per outline level below the top level, in points.
pub const INDENT_UNIT: f32 = 20.0;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.8;

/// Extra points added to the font size for the TOC title line.
pub const TITLE_LEADING: f32 = 6.0;

/// Gap between an entry's page-number label and the right margin, in points.
pub const NUMBER_GUTTER: f32 = 10.0;

/// Estimated glyph width as a multiple of the font size, used to
/// right-anchor page-number labels.
pub const LABEL_CHAR_FACTOR: f32 = 0.5;

/// One outline entry with its planned position on a synthesized page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedEntry {
    pub entry: OutlineEntry,
    /// Line slot in the destination synthesized page's top-down coordinates.
    pub rect: Rect,
    /// 0-based index among the synthesized pages.  Synthesized pages are
    /// inserted at the very front of the document, so this is also the
    /// absolute page index after assembly.
    pub synthesized_page_index: usize,
    /// `entry.target_page` shifted by the number of prepended TOC pages.
    pub adjusted_target_page: u32,
}

/// The complete page plan for one run.
#[derive(Debug, Clone, Serialize)]
pub struct PaginationPlan {
    pub title: String,
    pub font_size: f32,
    pub geometry: PageGeometry,
    pub toc_page_count: usize,
    pub entries: Vec<PlacedEntry>,
}

/// Layout cursor shared by both passes.  `advance` applies the break rule
/// and returns the page and top-down y the current line occupies.
struct Cursor {
    y: f32,
    page: usize,
}

impl Cursor {
    /// Start below the title block: the title line is sized at
    /// `font_size + TITLE_LEADING` and reserves two line heights.
    fn start(geometry: &PageGeometry, font_size: f32) -> Self {
        Self {
            y: geometry.margin + (font_size + TITLE_LEADING) * 2.0,
            page: 0,
        }
    }

    fn advance(&mut self, line_height: f32, geometry: &PageGeometry) -> (usize, f32) {
        if self.y + line_height > geometry.height - geometry.margin {
            self.page += 1;
            self.y = geometry.margin;
        }
        let line_top = self.y;
        self.y += line_height;
        (self.page, line_top)
    }
}

/// Plan the synthesized TOC pages for an outline.
///
/// Pure: identical inputs always produce identical page counts and
/// placements.
pub fn plan(
    outline: &[OutlineEntry],
    geometry: PageGeometry,
    font_size: f32,
    title: &str,
) -> PaginationPlan {
    let line_height = font_size * LINE_HEIGHT_FACTOR;

    // Pass 1: dry run, page count only.
    let mut cursor = Cursor::start(&geometry, font_size);
    for _ in outline {
        cursor.advance(line_height, &geometry);
    }
    let toc_page_count = cursor.page + 1;

    // Pass 2: identical walk, this time recording placements.
    let mut cursor = Cursor::start(&geometry, font_size);
    let entries = outline
        .iter()
        .map(|entry| {
            let (page, line_top) = cursor.advance(line_height, &geometry);
            let indent = entry.level.saturating_sub(1) as f32 * INDENT_UNIT;
            PlacedEntry {
                rect: Rect {
                    x1: geometry.margin + indent,
                    y1: line_top,
                    x2: geometry.width - geometry.margin,
                    y2: line_top + line_height,
                },
                synthesized_page_index: page,
                adjusted_target_page: entry.target_page + toc_page_count as u32,
                entry: entry.clone(),
            }
        })
        .collect();

    debug!(
        entries = outline.len(),
        toc_page_count, "pagination plan complete"
    );

    PaginationPlan {
        title: title.to_string(),
        font_size,
        geometry,
        toc_page_count,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn entry(level: u32, title: &str, target_page: u32) -> OutlineEntry {
        OutlineEntry {
            level,
            title: title.into(),
            target_page,
        }
    }

    fn sample_geometry() -> PageGeometry {
        PageGeometry {
            width: 595.0,
            height: 842.0,
            margin: 72.0,
        }
    }

    #[test]
    fn two_entry_scenario_matches_expected() {
        let outline = vec![entry(1, "Intro", 1), entry(1, "Chapter 1", 2)];
        let plan = plan(&outline, sample_geometry(), 12.0, "Contents");

        assert_eq!(plan.toc_page_count, 1);
        assert_eq!(plan.entries.len(), 2);
        assert!(plan.entries.iter().all(|p| p.synthesized_page_index == 0));
        assert_eq!(
            plan.entries
                .iter()
                .map(|p| p.adjusted_target_page)
                .collect::<Vec<_>>(),
            vec![2, 3]
        );

        // Cursor starts at margin + (12 + 6) * 2 = 108; line height 21.6.
        let first = &plan.entries[0];
        assert!((first.rect.x1 - 72.0).abs() < EPS);
        assert!((first.rect.x2 - 523.0).abs() < EPS);
        assert!((first.rect.y1 - 108.0).abs() < EPS);
        assert!((first.rect.y2 - 129.6).abs() < EPS);

        let second = &plan.entries[1];
        assert!((second.rect.y1 - 129.6).abs() < EPS);
    }

    #[test]
    fn short_outline_fits_one_page() {
        let outline: Vec<_> = (1..=5).map(|i| entry(1, "x", i)).collect();
        let plan = plan(&outline, sample_geometry(), 12.0, "Contents");
        assert_eq!(plan.toc_page_count, 1);
    }

    #[test]
    fn long_outline_breaks_onto_new_pages() {
        let outline: Vec<_> = (1..=100).map(|i| entry(1, "x", i)).collect();
        let plan = plan(&outline, sample_geometry(), 12.0, "Contents");

        assert!(plan.toc_page_count > 1);

        // The first entry of every page after the first starts at the top
        // margin (the title block is only reserved on page 0).
        for pair in plan.entries.windows(2) {
            if pair[1].synthesized_page_index != pair[0].synthesized_page_index {
                assert!((pair[1].rect.y1 - 72.0).abs() < EPS);
            }
        }
        assert!((plan.entries[0].rect.y1 - 108.0).abs() < EPS);

        // Page indices are monotonic and dense.
        let last_page = plan.entries.last().unwrap().synthesized_page_index;
        assert_eq!(plan.toc_page_count, last_page + 1);
    }

    #[test]
    fn adjusted_targets_shift_by_page_count() {
        let outline: Vec<_> = (1..=100).map(|i| entry(1, "x", i)).collect();
        let plan = plan(&outline, sample_geometry(), 12.0, "Contents");
        let shift = plan.toc_page_count as u32;
        for placed in &plan.entries {
            assert_eq!(
                placed.adjusted_target_page,
                placed.entry.target_page + shift
            );
        }
    }

    #[test]
    fn indentation_follows_level() {
        let outline = vec![entry(1, "a", 1), entry(2, "b", 1), entry(3, "c", 1)];
        let plan = plan(&outline, sample_geometry(), 12.0, "Contents");
        assert!((plan.entries[0].rect.x1 - 72.0).abs() < EPS);
        assert!((plan.entries[1].rect.x1 - 92.0).abs() < EPS);
        assert!((plan.entries[2].rect.x1 - 112.0).abs() < EPS);
    }

    #[test]
    fn planning_is_deterministic() {
        let outline: Vec<_> = (1..=250)
            .map(|i| entry(1 + (i % 3), "entry", i))
            .collect();
        let a = plan(&outline, sample_geometry(), 11.0, "Inhalt");
        let b = plan(&outline, sample_geometry(), 11.0, "Inhalt");
        assert_eq!(a.toc_page_count, b.toc_page_count);
        assert_eq!(a.entries, b.entries);
    }

    #[test]
    fn font_size_changes_the_break_point() {
        let outline: Vec<_> = (1..=60).map(|i| entry(1, "x", i)).collect();
        let small = plan(&outline, sample_geometry(), 8.0, "Contents");
        let large = plan(&outline, sample_geometry(), 24.0, "Contents");
        assert!(small.toc_page_count < large.toc_page_count);
    }
}
