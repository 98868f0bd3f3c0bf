// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Link-graph construction — turns placed TOC entries into rectangular
// navigation links between absolute page indices of the assembled document.

use blattwerk_core::types::Rect;
use serde::Serialize;

use crate::layout::PaginationPlan;

/// A rectangular hit-region on one page bound to a destination page.
///
/// Both indices are absolute 0-based positions in the assembled document:
/// synthesized pages occupy slots `0..toc_page_count`, so a source page
/// needs no translation, and a destination converts from the 1-based
/// adjusted target by subtracting one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkRecord {
    pub from_page: usize,
    pub rect: Rect,
    pub to_page: usize,
}

/// Derive one link per placed entry.  The destination anchor is always the
/// top-left of the destination page; that is applied at annotation time.
pub fn build_links(plan: &PaginationPlan) -> Vec<LinkRecord> {
    plan.entries
        .iter()
        .map(|placed| LinkRecord {
            from_page: placed.synthesized_page_index,
            rect: placed.rect,
            to_page: placed.adjusted_target_page as usize - 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::plan;
    use blattwerk_core::types::{OutlineEntry, PageGeometry};

    #[test]
    fn links_map_to_zero_based_absolute_pages() {
        let outline = vec![
            OutlineEntry {
                level: 1,
                title: "Intro".into(),
                target_page: 1,
            },
            OutlineEntry {
                level: 1,
                title: "Chapter 1".into(),
                target_page: 2,
            },
        ];
        let plan = plan(&outline, PageGeometry::a4(), 12.0, "Contents");
        let links = build_links(&plan);

        assert_eq!(links.len(), 2);
        // One TOC page prepended: original page 1 lands at absolute index 1.
        assert_eq!(links[0].from_page, 0);
        assert_eq!(links[0].to_page, 1);
        assert_eq!(links[1].to_page, 2);
    }

    #[test]
    fn link_rects_copy_the_plan() {
        let outline = vec![OutlineEntry {
            level: 2,
            title: "Deep".into(),
            target_page: 7,
        }];
        let plan = plan(&outline, PageGeometry::a4(), 12.0, "Contents");
        let links = build_links(&plan);
        assert_eq!(links[0].rect, plan.entries[0].rect);
    }

    #[test]
    fn every_entry_yields_exactly_one_link() {
        let outline: Vec<_> = (1..=120)
            .map(|i| OutlineEntry {
                level: 1,
                title: format!("Entry {i}"),
                target_page: i,
            })
            .collect();
        let plan = plan(&outline, PageGeometry::a4(), 12.0, "Contents");
        let links = build_links(&plan);
        assert_eq!(links.len(), plan.entries.len());
        for (link, placed) in links.iter().zip(&plan.entries) {
            assert_eq!(link.to_page + 1, placed.adjusted_target_page as usize);
        }
    }
}
