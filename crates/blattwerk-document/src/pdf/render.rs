// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// TOC page rendering — turns a pagination plan into PDF pages using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: pages are `Vec<Op>` operation
// lists serialised via `PdfDocument::save()`.  Plan coordinates are
// top-down; PDF text cursors are bottom-up, so every y is flipped against
// the page height here.

use blattwerk_core::error::Result;
use blattwerk_core::types::{BaselineFamily, FontHandle};
use printpdf::{
    BuiltinFont, FontId, Mm, Op, ParsedFont, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg,
    Point, Pt, TextItem,
};
use tracing::{debug, instrument, warn};

use crate::layout::{LABEL_CHAR_FACTOR, NUMBER_GUTTER, PaginationPlan, TITLE_LEADING};

/// Font actually used for page ops: a built-in family or a parsed embedded
/// payload registered with the document.
enum PageFont {
    Builtin(BuiltinFont),
    Custom(FontId),
}

/// Render every synthesized TOC page to a standalone PDF.
///
/// The returned bytes are an intermediate document; the assembler clones
/// its pages into the original.  An embedded font payload that fails to
/// parse degrades to the builtin font; font trouble never aborts a run.
#[instrument(skip_all, fields(pages = plan.toc_page_count, entries = plan.entries.len()))]
pub fn render_toc_pages(plan: &PaginationPlan, font: &FontHandle) -> Result<Vec<u8>> {
    let geometry = plan.geometry;
    let mut doc = PdfDocument::new(&plan.title);
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();

    let page_font = match font {
        FontHandle::Embedded(bytes) => match ParsedFont::from_bytes(bytes, 0, &mut warnings) {
            Some(parsed) => PageFont::Custom(doc.add_font(&parsed)),
            None => {
                warn!(
                    payload_bytes = bytes.len(),
                    "embedded font payload failed to parse; using builtin font"
                );
                PageFont::Builtin(BuiltinFont::Helvetica)
            }
        },
        FontHandle::Builtin(family) => PageFont::Builtin(builtin_font(*family)),
    };

    let page_w: Mm = Pt(geometry.width).into();
    let page_h: Mm = Pt(geometry.height).into();
    let title_size = plan.font_size + TITLE_LEADING;

    let mut pages: Vec<PdfPage> = Vec::with_capacity(plan.toc_page_count);
    for page_index in 0..plan.toc_page_count {
        let mut ops: Vec<Op> = Vec::new();

        // The title block is only reserved (and drawn) on the first page.
        if page_index == 0 {
            push_text(
                &mut ops,
                &page_font,
                title_size,
                geometry.margin,
                geometry.height - geometry.margin - title_size,
                &plan.title,
            );
        }

        for placed in plan
            .entries
            .iter()
            .filter(|p| p.synthesized_page_index == page_index)
        {
            // Baseline one em below the line slot's top edge.
            let baseline = geometry.height - placed.rect.y1 - plan.font_size;

            push_text(
                &mut ops,
                &page_font,
                plan.font_size,
                placed.rect.x1,
                baseline,
                &placed.entry.title,
            );

            // Right-anchored page-number label inside the right margin.
            let label = placed.adjusted_target_page.to_string();
            let label_width = label.chars().count() as f32 * plan.font_size * LABEL_CHAR_FACTOR;
            let label_x = geometry.width - geometry.margin - NUMBER_GUTTER - label_width;
            push_text(
                &mut ops,
                &page_font,
                plan.font_size,
                label_x,
                baseline,
                &label,
            );
        }

        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);

    debug!(bytes = bytes.len(), "TOC pages rendered");
    Ok(bytes)
}

/// Map a baseline family onto printpdf's builtin fonts.
fn builtin_font(family: BaselineFamily) -> BuiltinFont {
    match family {
        BaselineFamily::Helvetica => BuiltinFont::Helvetica,
        BaselineFamily::TimesRoman => BuiltinFont::TimesRoman,
        BaselineFamily::Courier => BuiltinFont::Courier,
    }
}

/// Emit one positioned text run.
fn push_text(ops: &mut Vec<Op>, font: &PageFont, size: f32, x: f32, y: f32, text: &str) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point { x: Pt(x), y: Pt(y) },
    });
    match font {
        PageFont::Builtin(builtin) => {
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(size),
                font: *builtin,
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(text.to_string())],
                font: *builtin,
            });
        }
        PageFont::Custom(id) => {
            ops.push(Op::SetFontSize {
                size: Pt(size),
                font: id.clone(),
            });
            ops.push(Op::WriteText {
                items: vec![TextItem::Text(text.to_string())],
                font: id.clone(),
            });
        }
    }
    ops.push(Op::EndTextSection);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::plan;
    use blattwerk_core::types::{OutlineEntry, PageGeometry};
    use std::sync::Arc;

    fn sample_plan(entries: usize) -> PaginationPlan {
        let outline: Vec<_> = (1..=entries as u32)
            .map(|i| OutlineEntry {
                level: 1,
                title: format!("Entry {i}"),
                target_page: i,
            })
            .collect();
        plan(&outline, PageGeometry::a4(), 12.0, "Contents")
    }

    #[test]
    fn renders_expected_page_count() {
        let plan = sample_plan(2);
        let font = FontHandle::Builtin(BaselineFamily::Helvetica);
        let bytes = render_toc_pages(&plan, &font).expect("render");

        assert!(bytes.starts_with(b"%PDF"));
        let doc = lopdf::Document::load_mem(&bytes).expect("reload");
        assert_eq!(doc.get_pages().len(), plan.toc_page_count);
    }

    #[test]
    fn multi_page_plans_render_every_page() {
        let plan = sample_plan(100);
        assert!(plan.toc_page_count > 1);
        let font = FontHandle::Builtin(BaselineFamily::TimesRoman);
        let bytes = render_toc_pages(&plan, &font).expect("render");
        let doc = lopdf::Document::load_mem(&bytes).expect("reload");
        assert_eq!(doc.get_pages().len(), plan.toc_page_count);
    }

    #[test]
    fn garbage_embedded_payload_degrades_to_builtin() {
        let plan = sample_plan(1);
        let font = FontHandle::Embedded(Arc::new(vec![0u8; 32]));
        let bytes = render_toc_pages(&plan, &font).expect("render despite bad payload");
        assert!(bytes.starts_with(b"%PDF"));
    }
}
