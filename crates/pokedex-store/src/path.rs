//! Dot-path access into nested documents (`"name.french"`).

use bson::{Bson, Document};

use crate::error::StoreError;

/// Resolve a dot-path against a document.
///
/// Only descends through sub-documents; an array or scalar in an
/// intermediate position ends the walk.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    match path.split_once('.') {
        None => doc.get(path),
        Some((head, rest)) => match doc.get(head)? {
            Bson::Document(sub) => get_path(sub, rest),
            _ => None,
        },
    }
}

/// Set the value at a dot-path, creating intermediate documents as needed.
pub(crate) fn set_path(doc: &mut Document, path: &str, value: Bson) -> Result<(), StoreError> {
    match path.split_once('.') {
        None => {
            doc.insert(path, value);
            Ok(())
        }
        Some((head, rest)) => {
            if !doc.contains_key(head) {
                doc.insert(head, Document::new());
            }
            match doc.get_mut(head) {
                Some(Bson::Document(sub)) => set_path(sub, rest, value),
                _ => Err(StoreError::InvalidUpdate(format!(
                    "cannot create field '{rest}' inside non-document field '{head}'"
                ))),
            }
        }
    }
}

/// Remove the value at a dot-path. Missing paths are a no-op.
pub(crate) fn unset_path(doc: &mut Document, path: &str) -> Option<Bson> {
    match path.split_once('.') {
        None => doc.remove(path),
        Some((head, rest)) => match doc.get_mut(head)? {
            Bson::Document(sub) => unset_path(sub, rest),
            _ => None,
        },
    }
}

/// Reject empty paths and empty segments (`"a..b"`, `".a"`).
pub(crate) fn check_path(path: &str) -> Result<(), StoreError> {
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(StoreError::InvalidUpdate(format!("invalid field path: '{path}'")));
    }
    Ok(())
}
