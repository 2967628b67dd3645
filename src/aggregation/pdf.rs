//! PDF validation and page-order-preserving merge

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

/// Page attributes a page may inherit from its `Pages` ancestors
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"Resources", b"CropBox", b"Rotate"];

/// Guards against `Parent` cycles in malformed page trees
const MAX_TREE_DEPTH: usize = 64;

/// Open a PDF and require at least one page
pub(crate) fn load_valid(path: &Path) -> Result<Document, String> {
    let doc = Document::load(path).map_err(|e| format!("failed to open PDF: {}", e))?;
    if doc.get_pages().is_empty() {
        return Err("PDF has no pages".to_string());
    }
    Ok(doc)
}

fn type_name(object: &Object) -> Option<&[u8]> {
    object
        .as_dict()
        .ok()
        .and_then(|d| d.get(b"Type").ok())
        .and_then(|t| t.as_name().ok())
}

/// Copy inheritable attributes down from the page's ancestors
///
/// Once pages are re-parented under a single flat `Pages` node, anything
/// they used to inherit would otherwise be lost.
fn flatten_page(doc: &Document, page: &Dictionary) -> Dictionary {
    let mut page = page.clone();

    for key in INHERITABLE {
        if page.has(key) {
            continue;
        }
        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut depth = 0;
        while let Some(id) = parent {
            depth += 1;
            if depth > MAX_TREE_DEPTH {
                break;
            }
            let Ok(node) = doc.get_dictionary(id) else {
                break;
            };
            if let Ok(value) = node.get(key) {
                page.set(key, value.clone());
                break;
            }
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        }
    }

    page
}

/// Merge documents into one, keeping every page in input order
pub(crate) fn merge(documents: Vec<Document>) -> Result<Document, String> {
    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for page_id in doc.get_pages().into_values() {
            let page = doc
                .get_dictionary(page_id)
                .map_err(|e| format!("unreadable page {:?}: {}", page_id, e))?;
            pages.push((page_id, flatten_page(&doc, page)));
        }

        objects.extend(doc.objects);
    }

    let mut document = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Dictionary)> = None;
    let mut root_pages: Option<(ObjectId, Dictionary)> = None;

    for (object_id, object) in objects {
        let kind = type_name(&object).map(<[u8]>::to_vec);
        match kind.as_deref() {
            Some(b"Catalog") => {
                if catalog.is_none() {
                    if let Ok(dict) = object.as_dict() {
                        catalog = Some((object_id, dict.clone()));
                    }
                }
            }
            Some(b"Pages") => {
                if root_pages.is_none() {
                    if let Ok(dict) = object.as_dict() {
                        root_pages = Some((object_id, dict.clone()));
                    }
                }
            }
            // Rebuilt below, or dropped (outlines point into the old trees)
            Some(b"Page") | Some(b"Outlines") | Some(b"Outline") => {}
            _ => {
                document.objects.insert(object_id, object);
            }
        }
    }

    let (pages_id, mut pages_dict) = root_pages.ok_or("no page tree found")?;
    let (catalog_id, mut catalog_dict) = catalog.ok_or("no document catalog found")?;

    let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();
    let count = i64::try_from(pages.len()).unwrap_or(i64::MAX);

    for (page_id, mut page) in pages {
        page.set("Parent", pages_id);
        document.objects.insert(page_id, Object::Dictionary(page));
    }

    pages_dict.set("Kids", kids);
    pages_dict.set("Count", count);
    pages_dict.remove(b"Parent");
    document.objects.insert(pages_id, Object::Dictionary(pages_dict));

    catalog_dict.set("Pages", pages_id);
    catalog_dict.remove(b"Outlines");
    document.objects.insert(catalog_id, Object::Dictionary(catalog_dict));

    document.trailer.set("Root", catalog_id);
    document.max_id = u32::try_from(document.objects.len()).unwrap_or(u32::MAX);
    document.renumber_objects();
    document.adjust_zero_pages();
    document.compress();

    Ok(document)
}
