// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outline ingestion — walks a document's bookmark tree (`/Outlines`) in
// document order and flattens it into `OutlineEntry` records.
//
// Destinations come in several shapes in the wild: direct `/Dest` arrays,
// `/A` GoTo actions, names resolved through the legacy catalog `/Dests`
// dictionary, and names resolved through the `/Names` destination tree.
// All four are handled; anything unresolvable falls back to page 1 so the
// listing stays complete.

use std::collections::{HashMap, HashSet};

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::OutlineEntry;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument, warn};

/// Nesting depth cap while walking the outline tree.  Malformed documents
/// must not recurse the walker into the ground.
const MAX_OUTLINE_DEPTH: u32 = 64;

/// Depth cap while chasing indirect references and name-tree nodes.
const MAX_REF_DEPTH: u32 = 32;

/// Read the document outline as a flat, document-ordered entry list.
///
/// Fails with [`BlattwerkError::NoOutline`] when the document carries no
/// outline entries at all; that condition is terminal and user-facing.
#[instrument(skip_all, fields(pages = doc.get_pages().len()))]
pub fn ingest(doc: &Document) -> Result<Vec<OutlineEntry>> {
    let catalog = doc
        .catalog()
        .map_err(|err| BlattwerkError::PdfError(format!("document has no catalog: {err}")))?;

    let page_numbers = page_number_map(doc);
    let mut entries = Vec::new();

    if let Some(first) = outline_first_item(doc, catalog) {
        let mut visited = HashSet::new();
        walk_items(doc, first, 1, &page_numbers, &mut visited, &mut entries);
    }

    if entries.is_empty() {
        return Err(BlattwerkError::NoOutline);
    }

    debug!(entries = entries.len(), "outline ingested");
    Ok(entries)
}

/// Whether rendering this outline (plus the TOC title) needs glyph
/// coverage beyond printable ASCII.  Computed once per run.
pub fn requires_extended_glyphs(entries: &[OutlineEntry], title: &str) -> bool {
    title.chars().any(|c| !c.is_ascii())
        || entries
            .iter()
            .any(|e| e.title.chars().any(|c| !c.is_ascii()))
}

// ---------------------------------------------------------------------------
// Tree walk
// ---------------------------------------------------------------------------

/// Map page object id -> 1-based page number.
fn page_number_map(doc: &Document) -> HashMap<ObjectId, u32> {
    doc.get_pages()
        .into_iter()
        .map(|(number, id)| (id, number))
        .collect()
}

/// The first item of the outline root, if the document has one.
fn outline_first_item(doc: &Document, catalog: &Dictionary) -> Option<ObjectId> {
    let root = catalog.get(b"Outlines").ok()?;
    let root_dict = deref(doc, root).as_dict().ok()?;
    root_dict.get(b"First").ok()?.as_reference().ok()
}

/// Walk one sibling chain (and recursively its children), pre-order, so
/// entries come out in document order.  The visited set guards against
/// sibling/child cycles in malformed files.
fn walk_items(
    doc: &Document,
    first: ObjectId,
    level: u32,
    page_numbers: &HashMap<ObjectId, u32>,
    visited: &mut HashSet<ObjectId>,
    out: &mut Vec<OutlineEntry>,
) {
    if level > MAX_OUTLINE_DEPTH {
        warn!(level, "outline deeper than supported; pruning");
        return;
    }

    let mut current = Some(first);
    while let Some(id) = current {
        if !visited.insert(id) {
            warn!(?id, "cycle in outline tree; stopping this chain");
            return;
        }

        let item = match doc.get_object(id) {
            Ok(Object::Dictionary(dict)) => dict,
            _ => {
                warn!(?id, "outline item is not a dictionary; stopping this chain");
                return;
            }
        };

        let title = item
            .get(b"Title")
            .ok()
            .map(|obj| deref(doc, obj))
            .and_then(|obj| match obj {
                Object::String(bytes, _) => Some(decode_pdf_text(bytes)),
                _ => None,
            })
            .unwrap_or_else(|| "Untitled".to_string());

        let target_page = entry_target_page(doc, item, page_numbers).unwrap_or_else(|| {
            warn!(title = %title, "outline destination unresolvable; defaulting to page 1");
            1
        });

        out.push(OutlineEntry {
            level,
            title,
            target_page,
        });

        if let Ok(child) = item.get(b"First")
            && let Ok(child_id) = child.as_reference()
        {
            walk_items(doc, child_id, level + 1, page_numbers, visited, out);
        }

        current = item
            .get(b"Next")
            .ok()
            .and_then(|obj| obj.as_reference().ok());
    }
}

// ---------------------------------------------------------------------------
// Destination resolution
// ---------------------------------------------------------------------------

/// Resolve an outline item's target to a 1-based page number.
///
/// Prefers `/Dest`; falls back to the `/D` of a `/A` GoTo action.
fn entry_target_page(
    doc: &Document,
    item: &Dictionary,
    page_numbers: &HashMap<ObjectId, u32>,
) -> Option<u32> {
    if let Ok(dest) = item.get(b"Dest") {
        return resolve_destination(doc, dest, page_numbers, 0);
    }

    let action = deref(doc, item.get(b"A").ok()?).as_dict().ok()?;
    let is_goto = action
        .get(b"S")
        .ok()
        .and_then(|s| deref(doc, s).as_name().ok())
        .is_some_and(|name| name == b"GoTo");
    if !is_goto {
        return None;
    }
    resolve_destination(doc, action.get(b"D").ok()?, page_numbers, 0)
}

/// Resolve any destination shape (array, named, wrapped in a `/D` dict)
/// to a 1-based page number.
fn resolve_destination(
    doc: &Document,
    dest: &Object,
    page_numbers: &HashMap<ObjectId, u32>,
    depth: u32,
) -> Option<u32> {
    if depth > MAX_REF_DEPTH {
        return None;
    }

    match deref(doc, dest) {
        Object::Array(items) => match items.first()? {
            // The common shape: [pageRef /XYZ left top zoom].
            Object::Reference(page_id) => page_numbers.get(page_id).copied(),
            // Rare but legal: a 0-based page index instead of a reference.
            Object::Integer(index) if *index >= 0 => Some(*index as u32 + 1),
            _ => None,
        },
        // A named destination; the name maps to a dest through the catalog.
        Object::String(name, _) => {
            let found = lookup_named_destination(doc, name)?;
            resolve_destination(doc, found, page_numbers, depth + 1)
        }
        Object::Name(name) => {
            let found = lookup_named_destination(doc, name)?;
            resolve_destination(doc, found, page_numbers, depth + 1)
        }
        // Name-tree values may wrap the array in a {/D ...} dictionary.
        Object::Dictionary(dict) => {
            resolve_destination(doc, dict.get(b"D").ok()?, page_numbers, depth + 1)
        }
        _ => None,
    }
}

/// Look a destination name up in the catalog: first the legacy `/Dests`
/// dictionary (PDF 1.1), then the `/Names` -> `/Dests` name tree.
fn lookup_named_destination<'a>(doc: &'a Document, name: &[u8]) -> Option<&'a Object> {
    let catalog = doc.catalog().ok()?;

    if let Ok(dests) = catalog.get(b"Dests")
        && let Ok(dests_dict) = deref(doc, dests).as_dict()
        && let Ok(found) = dests_dict.get(name)
    {
        return Some(found);
    }

    let names = deref(doc, catalog.get(b"Names").ok()?).as_dict().ok()?;
    let tree_root = names.get(b"Dests").ok()?;
    search_name_tree(doc, tree_root, name, 0)
}

/// Recursive name-tree lookup.  A linear scan over `/Names` pairs is fine
/// here: outline ingestion touches each name at most once per run.
fn search_name_tree<'a>(
    doc: &'a Document,
    node: &'a Object,
    name: &[u8],
    depth: u32,
) -> Option<&'a Object> {
    if depth > MAX_REF_DEPTH {
        return None;
    }

    let dict = deref(doc, node).as_dict().ok()?;

    if let Ok(pairs) = dict.get(b"Names")
        && let Object::Array(pairs) = deref(doc, pairs)
    {
        for pair in pairs.chunks(2) {
            if let [key, value] = pair
                && let Object::String(key_bytes, _) = deref(doc, key)
                && key_bytes == name
            {
                return Some(value);
            }
        }
    }

    if let Ok(kids) = dict.get(b"Kids")
        && let Object::Array(kids) = deref(doc, kids)
    {
        for kid in kids {
            if let Some(found) = search_name_tree(doc, kid, name, depth + 1) {
                return Some(found);
            }
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Follow indirect references to the underlying object, with a depth cap.
fn deref<'a>(doc: &'a Document, mut obj: &'a Object) -> &'a Object {
    let mut depth = 0;
    while let Object::Reference(id) = obj {
        if depth > MAX_REF_DEPTH {
            break;
        }
        match doc.get_object(*id) {
            Ok(next) => obj = next,
            Err(_) => break,
        }
        depth += 1;
    }
    obj
}

/// Decode a PDF text string: UTF-16BE when the BOM is present, otherwise
/// PDFDocEncoding (byte-per-char, which matches Latin-1 for the printable
/// range we care about).
pub(crate) fn decode_pdf_text(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}
