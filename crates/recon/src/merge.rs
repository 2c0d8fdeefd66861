//! Page-level PDF concatenation.
//!
//! The combined document is the base document's pages followed by the
//! supplement's pages, content streams untouched. Objects from both inputs
//! are renumbered into one id space and relinked under a fresh page tree.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::ReconError;

/// Append `supplement`'s pages after `base`'s pages into `out_path`.
pub fn append_pages(base: &Path, supplement: &Path, out_path: &Path) -> Result<(), ReconError> {
    let base_doc = load(base)?;
    let supplement_doc = load(supplement)?;

    let mut merged = concat_documents(vec![base_doc, supplement_doc])?;
    merged
        .save(out_path)
        .map_err(|e| ReconError::Merge(format!("cannot write {}: {e}", out_path.display())))?;
    Ok(())
}

/// Number of pages in a PDF on disk.
pub fn page_count(path: &Path) -> Result<usize, ReconError> {
    Ok(load(path)?.get_pages().len())
}

fn load(path: &Path) -> Result<Document, ReconError> {
    Document::load(path)
        .map_err(|e| ReconError::Merge(format!("cannot read {}: {e}", path.display())))
}

/// Merge documents into one, keeping each document's page order and the
/// overall document order.
fn concat_documents(documents: Vec<Document>) -> Result<Document, ReconError> {
    let mut max_id = 1;
    let mut page_order: Vec<ObjectId> = Vec::new();
    let mut all_pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut all_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        // get_pages is keyed by page number, so iteration preserves the
        // document's own page sequence.
        for (_, object_id) in doc.get_pages() {
            let page = doc
                .get_object(object_id)
                .map_err(|e| ReconError::Merge(format!("unreadable page object: {e}")))?
                .to_owned();
            all_pages.insert(object_id, page);
            page_order.push(object_id);
        }
        all_objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog_object: Option<(ObjectId, Object)> = None;
    let mut pages_object: Option<(ObjectId, Object)> = None;

    for (object_id, object) in all_objects.iter() {
        match dict_type(object) {
            b"Catalog" => {
                catalog_object = Some((
                    catalog_object.map(|(id, _)| id).unwrap_or(*object_id),
                    object.clone(),
                ));
            }
            b"Pages" => {
                // Fold every source page tree's attributes into one node.
                if let Ok(dictionary) = object.as_dict() {
                    let mut dictionary = dictionary.clone();
                    if let Some((_, ref existing)) = pages_object {
                        if let Ok(existing) = existing.as_dict() {
                            dictionary.extend(existing);
                        }
                    }
                    pages_object = Some((
                        pages_object.map(|(id, _)| id).unwrap_or(*object_id),
                        Object::Dictionary(dictionary),
                    ));
                }
            }
            b"Page" => {} // handled below via all_pages
            b"Outlines" | b"Outline" => {} // dropped, not meaningful after concat
            _ => {
                merged.objects.insert(*object_id, object.clone());
            }
        }
    }

    let (pages_id, pages_dict) =
        pages_object.ok_or_else(|| ReconError::Merge("no Pages root found".into()))?;
    let (catalog_id, catalog_dict) =
        catalog_object.ok_or_else(|| ReconError::Merge("no Catalog found".into()))?;

    for (object_id, object) in all_pages.iter() {
        if let Ok(dictionary) = object.as_dict() {
            let mut dictionary = dictionary.clone();
            dictionary.set("Parent", pages_id);
            merged.objects.insert(*object_id, Object::Dictionary(dictionary));
        }
    }

    if let Ok(dictionary) = pages_dict.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Count", page_order.len() as u32);
        dictionary.set(
            "Kids",
            page_order.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
        );
        merged.objects.insert(pages_id, Object::Dictionary(dictionary));
    }

    if let Ok(dictionary) = catalog_dict.as_dict() {
        let mut dictionary: Dictionary = dictionary.clone();
        dictionary.set("Pages", pages_id);
        dictionary.remove(b"Outlines");
        merged.objects.insert(catalog_id, Object::Dictionary(dictionary));
    }

    merged.trailer.set("Root", catalog_id);
    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.compress();
    Ok(merged)
}

/// The `/Type` name of a dictionary object, or empty for everything else
/// (streams, arrays, primitives).
fn dict_type(object: &Object) -> &[u8] {
    object
        .as_dict()
        .ok()
        .and_then(|dict| dict.get(b"Type").ok())
        .and_then(|name| name.as_name().ok())
        .unwrap_or(b"")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::BufWriter;

    use printpdf::{BuiltinFont, Mm, PdfDocument};

    /// One text line per requested page.
    fn write_pdf(path: &Path, labels: &[&str]) {
        let (doc, first_page, first_layer) =
            PdfDocument::new("fixture", Mm(215.9), Mm(279.4), "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica).unwrap();
        let mut pages = vec![(first_page, first_layer)];
        for _ in 1..labels.len() {
            pages.push(doc.add_page(Mm(215.9), Mm(279.4), "Layer 1"));
        }
        for ((page, layer), label) in pages.into_iter().zip(labels) {
            doc.get_page(page)
                .get_layer(layer)
                .use_text(*label, 12.0, Mm(20.0), Mm(260.0), &font);
        }
        let mut writer = BufWriter::new(fs::File::create(path).unwrap());
        doc.save(&mut writer).unwrap();
    }

    #[test]
    fn concatenates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.pdf");
        let supplement = dir.path().join("supplement.pdf");
        let out = dir.path().join("combined.pdf");
        write_pdf(&base, &["base page one", "base page two"]);
        write_pdf(&supplement, &["supplement page"]);

        append_pages(&base, &supplement, &out).unwrap();

        assert_eq!(page_count(&out).unwrap(), 3);
        let doc = Document::load(&out).unwrap();
        assert!(doc.extract_text(&[1]).unwrap().contains("base page one"));
        assert!(doc.extract_text(&[2]).unwrap().contains("base page two"));
        assert!(doc.extract_text(&[3]).unwrap().contains("supplement page"));
    }

    #[test]
    fn unreadable_base_is_merge_error() {
        let dir = tempfile::tempdir().unwrap();
        let supplement = dir.path().join("supplement.pdf");
        write_pdf(&supplement, &["supplement page"]);

        let err = append_pages(
            Path::new("/nonexistent/base.pdf"),
            &supplement,
            &dir.path().join("combined.pdf"),
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::Merge(_)));
    }

    #[test]
    fn garbage_base_is_merge_error() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.pdf");
        let supplement = dir.path().join("supplement.pdf");
        fs::write(&base, b"not a pdf at all").unwrap();
        write_pdf(&supplement, &["supplement page"]);

        let err = append_pages(&base, &supplement, &dir.path().join("combined.pdf"))
            .unwrap_err();
        assert!(matches!(err, ReconError::Merge(_)));
    }
}
