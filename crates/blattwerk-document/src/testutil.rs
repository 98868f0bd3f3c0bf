// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared in-memory PDF fixtures for unit tests.  No binary fixture files:
// every test document is synthesized with lopdf.

use lopdf::{Document, Object, ObjectId, dictionary};

/// Build a minimal document with `page_count` empty A4 pages and a valid
/// catalog/page tree.  Returns the document, the page object ids in page
/// order, and the catalog id.
pub(crate) fn base_doc(page_count: usize) -> (Document, Vec<ObjectId>, ObjectId) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let page_ids: Vec<ObjectId> = (0..page_count)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            })
        })
        .collect();

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    (doc, page_ids, catalog_id)
}

/// An explicit `/Dest` array pointing at a page object, top-left anchored.
pub(crate) fn dest_array(page_id: ObjectId) -> Object {
    Object::Array(vec![
        Object::Reference(page_id),
        "XYZ".into(),
        Object::Real(0.0),
        Object::Real(842.0),
        Object::Null,
    ])
}

/// Attach a flat outline (all level 1) to a document built by `base_doc`.
/// `titles[i]` becomes an entry pointing at `page_ids[i]`.
pub(crate) fn attach_flat_outline(
    doc: &mut Document,
    catalog_id: ObjectId,
    page_ids: &[ObjectId],
    titles: &[&str],
) {
    let outlines_id = doc.new_object_id();
    let item_ids: Vec<ObjectId> = titles.iter().map(|_| doc.new_object_id()).collect();

    for (i, title) in titles.iter().enumerate() {
        let mut item = dictionary! {
            "Title" => Object::string_literal(*title),
            "Parent" => Object::Reference(outlines_id),
            "Dest" => dest_array(page_ids[i]),
        };
        if i > 0 {
            item.set("Prev", Object::Reference(item_ids[i - 1]));
        }
        if i + 1 < titles.len() {
            item.set("Next", Object::Reference(item_ids[i + 1]));
        }
        doc.objects.insert(item_ids[i], Object::Dictionary(item));
    }

    doc.objects.insert(
        outlines_id,
        Object::Dictionary(dictionary! {
            "Type" => "Outlines",
            "First" => Object::Reference(item_ids[0]),
            "Last" => Object::Reference(item_ids[titles.len() - 1]),
            "Count" => titles.len() as i64,
        }),
    );

    if let Ok(Object::Dictionary(catalog)) = doc.get_object_mut(catalog_id) {
        catalog.set("Outlines", Object::Reference(outlines_id));
    }
}

