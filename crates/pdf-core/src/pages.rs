//! Page tree manipulation
//!
//! Appending pages works on the root `/Pages` node only: new pages are pushed
//! onto its `/Kids` array and re-parented there, so attributes a page used to
//! inherit from an intermediate node are copied onto the page first.

use crate::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;

/// Which pages of a source document to append
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSelection {
    /// Every page, in original order
    #[default]
    All,
    /// Only the first page
    FirstOnly,
}

/// Page attributes that may be inherited from an ancestor `/Pages` node
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Get the object ID of the root `/Pages` node
pub(crate) fn pages_root_id(doc: &Document) -> Result<ObjectId> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| PdfError::ParseError("Document trailer missing Root reference".to_string()))?;
    let catalog = doc
        .get_object(catalog_id)?
        .as_dict()
        .map_err(|_| PdfError::ParseError("Catalog is not a dictionary".to_string()))?;
    catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| PdfError::ParseError("Catalog missing Pages reference".to_string()))
}

/// Push page objects onto the root `/Kids` array and fix up `/Count`
pub(crate) fn push_pages(doc: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
    let pages_id = pages_root_id(doc)?;

    for page_id in page_ids {
        let page = doc
            .get_object_mut(*page_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;
        page.set("Parent", Object::Reference(pages_id));
    }

    let pages_dict = doc
        .get_object_mut(pages_id)?
        .as_dict_mut()
        .map_err(|_| PdfError::ParseError("Pages object is not a dictionary".to_string()))?;

    let mut kids = match pages_dict.get(b"Kids") {
        Ok(Object::Array(kids)) => kids.clone(),
        _ => Vec::new(),
    };
    kids.extend(page_ids.iter().map(|id| Object::Reference(*id)));

    let count = pages_dict
        .get(b"Count")
        .and_then(Object::as_i64)
        .unwrap_or(0);

    pages_dict.set("Kids", Object::Array(kids));
    pages_dict.set("Count", Object::Integer(count + page_ids.len() as i64));

    Ok(())
}

/// Find an attribute on a page or the nearest ancestor that defines it
pub(crate) fn inherited_attribute(
    doc: &Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<Object> {
    let mut current_id = page_id;

    // Page trees deeper than this are treated as malformed
    for _ in 0..32 {
        let dict = doc.get_object(current_id).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current_id = *parent_id,
            _ => return None,
        }
    }

    None
}

/// Append pages of `source` to the end of `dest`
///
/// Object IDs of the source are shifted past `dest.max_id`, the selected pages
/// are attached to the destination root, and objects that became unreachable
/// (the source catalog, unselected pages) are pruned.
///
/// # Returns
/// The object IDs of the appended pages, in order
pub(crate) fn append_pages(
    dest: &mut Document,
    mut source: Document,
    selection: PageSelection,
) -> Result<Vec<ObjectId>> {
    let mut source_pages: Vec<ObjectId> = source.get_pages().values().copied().collect();
    if selection == PageSelection::FirstOnly {
        source_pages.truncate(1);
    }
    if source_pages.is_empty() {
        return Ok(Vec::new());
    }

    // Materialize inherited attributes before the pages lose their parents
    for &page_id in &source_pages {
        let mut resolved: Vec<(&[u8], Object)> = Vec::new();
        for key in INHERITABLE {
            if let Some(value) = inherited_attribute(&source, page_id, key) {
                resolved.push((key, value));
            }
        }
        let page = source
            .get_object_mut(page_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;
        for (key, value) in resolved {
            if page.get(key).is_err() {
                page.set(key, value);
            }
        }
    }

    let id_offset = dest.max_id;
    let mut remapped = BTreeMap::new();
    for (old_id, object) in std::mem::take(&mut source.objects) {
        remapped.insert(
            (old_id.0 + id_offset, old_id.1),
            remap_object_refs(object, id_offset),
        );
    }
    dest.objects.extend(remapped);
    dest.max_id = (source.max_id + id_offset).max(dest.max_id);

    let new_pages: Vec<ObjectId> = source_pages
        .iter()
        .map(|id| (id.0 + id_offset, id.1))
        .collect();
    push_pages(dest, &new_pages)?;
    dest.prune_objects();

    Ok(new_pages)
}

/// Recursively shift object references by `offset`
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(dict) => Object::Dictionary(remap_dict(&dict, offset)),
        Object::Stream(mut stream) => {
            stream.dict = remap_dict(&stream.dict, offset);
            Object::Stream(stream)
        }
        other => other,
    }
}

fn remap_dict(dict: &Dictionary, offset: u32) -> Dictionary {
    dict.iter()
        .map(|(key, value)| (key.clone(), remap_object_refs(value.clone(), offset)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    /// Document whose pages hang off an intermediate `/Pages` node that
    /// carries the MediaBox
    fn nested_document(pages: usize) -> Document {
        let mut doc = Document::with_version("1.5");
        let root_pages_id = doc.new_object_id();
        let inner_pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for i in 0..pages {
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                format!("BT /F1 12 Tf 50 700 Td (Page {}) Tj ET", i + 1).into_bytes(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => inner_pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            inner_pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Parent" => root_pages_id,
                "Kids" => kids,
                "Count" => pages as i64,
                "MediaBox" => vec![0.into(), 0.into(), 300.into(), 400.into()],
            }),
        );
        doc.objects.insert(
            root_pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(inner_pages_id)],
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => root_pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_inherited_attribute_walks_parents() {
        let doc = nested_document(1);
        let page_id = *doc.get_pages().get(&1).unwrap();
        let media_box = inherited_attribute(&doc, page_id, b"MediaBox").unwrap();
        assert_eq!(media_box.as_array().unwrap().len(), 4);
        assert!(inherited_attribute(&doc, page_id, b"Rotate").is_none());
    }

    #[test]
    fn test_append_all_pages() {
        let mut dest = nested_document(1);
        let appended = append_pages(&mut dest, nested_document(3), PageSelection::All).unwrap();

        assert_eq!(appended.len(), 3);
        assert_eq!(dest.get_pages().len(), 4);

        // Appended pages keep the MediaBox they used to inherit
        for id in appended {
            let page = dest.get_object(id).unwrap().as_dict().unwrap();
            assert!(page.get(b"MediaBox").is_ok());
        }
    }

    #[test]
    fn test_append_first_only() {
        let mut dest = nested_document(2);
        let appended =
            append_pages(&mut dest, nested_document(5), PageSelection::FirstOnly).unwrap();

        assert_eq!(appended.len(), 1);
        assert_eq!(dest.get_pages().len(), 3);
    }

    #[test]
    fn test_append_preserves_order() {
        let mut dest = nested_document(1);
        let appended = append_pages(&mut dest, nested_document(3), PageSelection::All).unwrap();
        let pages: Vec<ObjectId> = dest.get_pages().values().copied().collect();
        assert_eq!(&pages[1..], appended.as_slice());

        let last = dest.get_object(appended[2]).unwrap().as_dict().unwrap();
        let content_id = last.get(b"Contents").unwrap().as_reference().unwrap();
        let content = &dest.get_object(content_id).unwrap().as_stream().unwrap().content;
        assert!(String::from_utf8_lossy(content).contains("(Page 3)"));
    }

    #[test]
    fn test_remap_object_refs() {
        let obj = Object::Array(vec![
            Object::Reference((1, 0)),
            Object::Dictionary(dictionary! { "A" => Object::Reference((2, 0)) }),
        ]);
        let remapped = remap_object_refs(obj, 10);
        let arr = remapped.as_array().unwrap();
        assert_eq!(arr[0].as_reference().unwrap(), (11, 0));
        let dict = arr[1].as_dict().unwrap();
        assert_eq!(dict.get(b"A").unwrap().as_reference().unwrap(), (12, 0));
    }

    #[test]
    fn test_remap_stream_dict_keeps_keys_and_order() {
        let stream = Stream::new(
            dictionary! {
                "Length" => 4_i64,
                "Resources" => Object::Reference((3, 0)),
            },
            b"q Q\n".to_vec(),
        );
        let remapped = remap_object_refs(Object::Stream(stream), 5);
        let stream = remapped.as_stream().unwrap();

        let keys: Vec<&[u8]> = stream.dict.iter().map(|(key, _)| key.as_slice()).collect();
        assert_eq!(keys, vec![b"Length".as_slice(), b"Resources".as_slice()]);
        assert_eq!(stream.dict.get(b"Length").unwrap().as_i64().unwrap(), 4);
        assert_eq!(
            stream.dict.get(b"Resources").unwrap().as_reference().unwrap(),
            (8, 0)
        );
        assert_eq!(stream.content, b"q Q\n".to_vec());
    }
}
