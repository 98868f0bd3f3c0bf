// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembly — merges rendered TOC pages into the original
// document using `lopdf`.
//
// The synthesized pages are prepended at page-tree position 0, which is
// what lets every downstream index stand without further translation:
// synthesized page i is absolute page i, and original page n becomes
// absolute page n + toc_page_count.

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::{FontHandle, OutlineEntry, PageGeometry, TocOptions};
use lopdf::{Document, Object, ObjectId, StringFormat, dictionary};
use tracing::{debug, info, instrument, warn};

use crate::layout::PaginationPlan;
use crate::links::LinkRecord;
use crate::pdf::render;

/// Depth cap while resolving inherited page attributes.
const MAX_TREE_DEPTH: u32 = 32;

/// Render the planned TOC pages, prepend them to the original document,
/// attach the navigation links, optionally rewrite the outline, and
/// serialize.
///
/// A zero-length serialization is a fatal integrity failure: it is
/// indistinguishable from total corruption and is never surfaced as
/// success.
#[instrument(skip_all, fields(toc_pages = plan.toc_page_count, links = links.len(), add_bookmark = options.add_bookmark))]
pub fn assemble(
    mut original: Document,
    plan: &PaginationPlan,
    links: &[LinkRecord],
    outline: &[OutlineEntry],
    options: &TocOptions,
    font: &FontHandle,
) -> Result<Vec<u8>> {
    let toc_bytes = render::render_toc_pages(plan, font)?;
    let toc_doc = Document::load_mem(&toc_bytes).map_err(|err| {
        BlattwerkError::PdfError(format!("failed to reload rendered TOC pages: {err}"))
    })?;

    // get_pages is keyed 1-based and ordered, so enumerate gives each TOC
    // page its insertion position at the front of the original.
    for (position, (_, page_id)) in toc_doc.get_pages().iter().enumerate() {
        import_page_at(&toc_doc, &mut original, *page_id, position)?;
    }

    attach_links(&mut original, links, &plan.geometry);

    if options.add_bookmark {
        rebuild_outline(&mut original, outline, &options.title, plan.toc_page_count)?;
    }

    let mut output = Vec::new();
    original.save_to(&mut output).map_err(|err| {
        BlattwerkError::PdfError(format!("failed to serialize assembled document: {err}"))
    })?;
    verify_output(&output)?;

    info!(
        total_pages = original.get_pages().len(),
        bytes = output.len(),
        "document assembled"
    );
    Ok(output)
}

/// The integrity gate on serialized output.
fn verify_output(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(BlattwerkError::RenderIntegrity);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Page import
// ---------------------------------------------------------------------------

/// Clone one page (and everything it references) from `source` into
/// `target`, inserting it at `position` in the target's page tree.
fn import_page_at(
    source: &Document,
    target: &mut Document,
    page_id: ObjectId,
    position: usize,
) -> Result<ObjectId> {
    let page_object = source.get_object(page_id).map_err(|err| {
        BlattwerkError::PdfError(format!("cannot read TOC page object {page_id:?}: {err}"))
    })?;

    let cloned = clone_into(source, target, page_object);
    let cloned_id = target.add_object(cloned);

    let pages_id = page_tree_root(target)?;
    if let Ok(Object::Dictionary(pages_dict)) = target.get_object_mut(pages_id) {
        if let Ok(Object::Array(kids)) = pages_dict.get_mut(b"Kids") {
            kids.insert(position.min(kids.len()), Object::Reference(cloned_id));
        }
        if let Ok(Object::Integer(count)) = pages_dict.get_mut(b"Count") {
            *count += 1;
        }
    }

    // The clone skipped /Parent; point the imported page at the target tree.
    if let Ok(Object::Dictionary(page_dict)) = target.get_object_mut(cloned_id) {
        page_dict.set("Parent", Object::Reference(pages_id));
    }

    debug!(?cloned_id, position, "TOC page imported");
    Ok(cloned_id)
}

/// The target document's page tree root (`/Pages`).
fn page_tree_root(doc: &Document) -> Result<ObjectId> {
    let catalog = doc
        .catalog()
        .map_err(|err| BlattwerkError::PdfError(format!("no catalog: {err}")))?;
    match catalog.get(b"Pages") {
        Ok(Object::Reference(id)) => Ok(*id),
        _ => Err(BlattwerkError::PdfError(
            "/Pages is not a reference".to_string(),
        )),
    }
}

/// Deep-clone an object graph across documents, materialising every
/// reference as a new object in `target`.
///
/// `/Parent` is deliberately skipped: following it would clone the whole
/// source page tree; the caller re-points it after insertion.  Rendered
/// TOC pages are small and freshly generated, so shared-resource
/// duplication is not a concern here.
fn clone_into(source: &Document, target: &mut Document, object: &Object) -> Object {
    match object {
        Object::Dictionary(dict) => {
            let mut new_dict = lopdf::Dictionary::new();
            for (key, value) in dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                let cloned = clone_into(source, target, value);
                new_dict.set(key.clone(), cloned);
            }
            Object::Dictionary(new_dict)
        }
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| clone_into(source, target, item))
                .collect(),
        ),
        Object::Reference(ref_id) => match source.get_object(*ref_id) {
            Ok(referenced) => {
                let cloned = clone_into(source, target, referenced);
                Object::Reference(target.add_object(cloned))
            }
            Err(err) => {
                warn!(?ref_id, %err, "unresolvable reference in rendered page; using Null");
                Object::Null
            }
        },
        Object::Stream(stream) => {
            let mut new_dict = lopdf::Dictionary::new();
            for (key, value) in stream.dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                let cloned = clone_into(source, target, value);
                new_dict.set(key.clone(), cloned);
            }
            Object::Stream(lopdf::Stream::new(new_dict, stream.content.clone()))
        }
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Link annotations
// ---------------------------------------------------------------------------

/// Attach every link record as a go-to-page annotation on its source page.
///
/// Links whose destination falls past the final page are skipped with a
/// warning; outlines in the wild do point past the last page.
fn attach_links(doc: &mut Document, links: &[LinkRecord], geometry: &PageGeometry) {
    let pages = doc.get_pages();
    let total = pages.len();

    for link in links {
        let Some(&from_id) = pages.get(&(link.from_page as u32 + 1)) else {
            warn!(from_page = link.from_page, "link source page missing; skipping");
            continue;
        };
        let Some(&to_id) = pages.get(&(link.to_page as u32 + 1)) else {
            warn!(
                to_page = link.to_page,
                total, "link destination beyond final page; skipping"
            );
            continue;
        };

        // Plan rects are top-down; annotation rects are bottom-up.
        let annot_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => vec![
                Object::Real(link.rect.x1),
                Object::Real(geometry.height - link.rect.y2),
                Object::Real(link.rect.x2),
                Object::Real(geometry.height - link.rect.y1),
            ],
            "Border" => vec![0.into(), 0.into(), 0.into()],
            "Dest" => destination_array(to_id, page_top(doc, to_id)),
        });
        push_page_annotation(doc, from_id, annot_id);
    }
}

/// A `/Dest` array anchored at the destination page's top-left.
fn destination_array(page_id: ObjectId, top: f32) -> Vec<Object> {
    vec![
        Object::Reference(page_id),
        "XYZ".into(),
        Object::Real(0.0),
        Object::Real(top),
        Object::Null,
    ]
}

/// Append an annotation to a page's `/Annots`, which may be absent,
/// inline, or an indirect reference to the array.
fn push_page_annotation(doc: &mut Document, page_id: ObjectId, annot_id: ObjectId) {
    let existing = match doc.get_object(page_id) {
        Ok(Object::Dictionary(dict)) => dict.get(b"Annots").ok().cloned(),
        _ => None,
    };

    match existing {
        Some(Object::Reference(array_id)) => {
            if let Ok(Object::Array(array)) = doc.get_object_mut(array_id) {
                array.push(Object::Reference(annot_id));
            } else {
                warn!(?array_id, "page /Annots reference is not an array; replacing");
                set_page_annots(doc, page_id, vec![Object::Reference(annot_id)]);
            }
        }
        Some(Object::Array(mut array)) => {
            array.push(Object::Reference(annot_id));
            set_page_annots(doc, page_id, array);
        }
        _ => set_page_annots(doc, page_id, vec![Object::Reference(annot_id)]),
    }
}

fn set_page_annots(doc: &mut Document, page_id: ObjectId, array: Vec<Object>) {
    if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
        page.set("Annots", Object::Array(array));
    }
}

/// Top edge of a page's media box, following page-tree inheritance.
fn page_top(doc: &Document, page_id: ObjectId) -> f32 {
    media_box_top(doc, page_id, 0).unwrap_or(842.0)
}

fn media_box_top(doc: &Document, node_id: ObjectId, depth: u32) -> Option<f32> {
    if depth > MAX_TREE_DEPTH {
        return None;
    }
    let dict = doc.get_object(node_id).ok()?.as_dict().ok()?;

    if let Ok(media_box) = dict.get(b"MediaBox") {
        let array = match media_box {
            Object::Array(array) => Some(array),
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(Object::Array(array)) => Some(array),
                _ => None,
            },
            _ => None,
        }?;
        return as_number(array.get(3)?);
    }

    let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
    media_box_top(doc, parent, depth + 1)
}

fn as_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Outline rewrite
// ---------------------------------------------------------------------------

/// Replace the catalog `/Outlines` with a tree listing the TOC itself
/// first, then every original entry with its target shifted past the
/// prepended pages.
fn rebuild_outline(
    doc: &mut Document,
    outline: &[OutlineEntry],
    toc_title: &str,
    toc_page_count: usize,
) -> Result<()> {
    let pages = doc.get_pages();

    let mut items: Vec<OutlineEntry> = Vec::with_capacity(outline.len() + 1);
    items.push(OutlineEntry {
        level: 1,
        title: toc_title.to_string(),
        target_page: 1,
    });
    for entry in outline {
        items.push(OutlineEntry {
            level: entry.level,
            title: entry.title.clone(),
            target_page: entry.target_page + toc_page_count as u32,
        });
    }

    // Destinations resolved up front (immutably) so item creation below can
    // borrow the document mutably.
    let dests: Vec<Option<Vec<Object>>> = items
        .iter()
        .map(|item| {
            pages
                .get(&item.target_page)
                .map(|&page_id| destination_array(page_id, page_top(doc, page_id)))
        })
        .collect();

    let outlines_id = doc.new_object_id();
    let ids: Vec<ObjectId> = items
        .iter()
        .zip(&dests)
        .map(|(item, dest)| {
            let mut dict = dictionary! { "Title" => encode_pdf_text(&item.title) };
            match dest {
                Some(dest) => dict.set("Dest", Object::Array(dest.clone())),
                None => warn!(
                    title = %item.title,
                    target = item.target_page,
                    "bookmark target beyond final page; leaving entry without destination"
                ),
            }
            doc.add_object(dict)
        })
        .collect();

    // Reconstruct the hierarchy from the flat levels.
    let n = items.len();
    let mut parent: Vec<Option<usize>> = vec![None; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut next: Vec<Option<usize>> = vec![None; n];
    let mut first_child: Vec<Option<usize>> = vec![None; n];
    let mut last_child: Vec<Option<usize>> = vec![None; n];
    let mut root_first: Option<usize> = None;
    let mut root_last: Option<usize> = None;
    let mut stack: Vec<usize> = Vec::new();

    for i in 0..n {
        let level = items[i].level;
        while let Some(&top) = stack.last() {
            if items[top].level >= level {
                stack.pop();
            } else {
                break;
            }
        }
        match stack.last().copied() {
            Some(p) => {
                parent[i] = Some(p);
                match last_child[p] {
                    Some(sibling) => {
                        prev[i] = Some(sibling);
                        next[sibling] = Some(i);
                    }
                    None => first_child[p] = Some(i),
                }
                last_child[p] = Some(i);
            }
            None => {
                if let Some(sibling) = root_last {
                    prev[i] = Some(sibling);
                    next[sibling] = Some(i);
                }
                root_first.get_or_insert(i);
                root_last = Some(i);
            }
        }
        stack.push(i);
    }

    // Open descendant counts for /Count.
    let mut descendants = vec![0i64; n];
    for i in (0..n).rev() {
        if let Some(p) = parent[i] {
            descendants[p] += descendants[i] + 1;
        }
    }

    for i in 0..n {
        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(ids[i]) {
            dict.set(
                "Parent",
                Object::Reference(parent[i].map_or(outlines_id, |p| ids[p])),
            );
            if let Some(p) = prev[i] {
                dict.set("Prev", Object::Reference(ids[p]));
            }
            if let Some(nx) = next[i] {
                dict.set("Next", Object::Reference(ids[nx]));
            }
            if let (Some(first), Some(last)) = (first_child[i], last_child[i]) {
                dict.set("First", Object::Reference(ids[first]));
                dict.set("Last", Object::Reference(ids[last]));
                dict.set("Count", Object::Integer(descendants[i]));
            }
        }
    }

    doc.objects.insert(
        outlines_id,
        Object::Dictionary(dictionary! {
            "Type" => "Outlines",
            "First" => Object::Reference(ids[root_first.unwrap_or(0)]),
            "Last" => Object::Reference(ids[root_last.unwrap_or(0)]),
            "Count" => n as i64,
        }),
    );

    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|err| BlattwerkError::PdfError(format!("no /Root in trailer: {err}")))?;
    if let Ok(Object::Dictionary(catalog)) = doc.get_object_mut(catalog_id) {
        catalog.set("Outlines", Object::Reference(outlines_id));
        // Ask viewers to show the rewritten panel.
        catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));
    }

    debug!(entries = n, "outline rewritten");
    Ok(())
}

/// Encode a bookmark title: plain literal for ASCII, UTF-16BE with BOM
/// otherwise.
fn encode_pdf_text(text: &str) -> Object {
    if text.is_ascii() {
        Object::string_literal(text)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}
