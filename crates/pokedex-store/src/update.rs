use bson::{Bson, Document};

use crate::error::StoreError;
use crate::path::{check_path, get_path, set_path, unset_path};

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    Set(String, Bson),
    Unset(String),
    Inc(String, Bson),
}

/// A parsed update document.
///
/// Follows document-database update semantics:
/// - plain top-level keys are an implicit `$set` of that field
/// - `{ "$set": { path: value } }` sets dot-paths, creating sub-documents
/// - `{ "$unset": { path: _ } }` removes fields
/// - `{ "$inc": { path: number } }` adds to a numeric field (missing counts as 0)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Update {
    pub ops: Vec<UpdateOp>,
}

impl Update {
    pub fn parse(doc: &Document) -> Result<Self, StoreError> {
        let mut ops = Vec::new();

        for (key, value) in doc {
            match key.as_str() {
                "$set" => {
                    for (path, v) in operator_doc(key, value)? {
                        check_path(path)?;
                        ops.push(UpdateOp::Set(path.clone(), v.clone()));
                    }
                }
                "$unset" => {
                    for (path, _) in operator_doc(key, value)? {
                        check_path(path)?;
                        ops.push(UpdateOp::Unset(path.clone()));
                    }
                }
                "$inc" => {
                    for (path, v) in operator_doc(key, value)? {
                        check_path(path)?;
                        if !is_number(v) {
                            return Err(StoreError::InvalidUpdate(format!(
                                "$inc value for '{path}' must be a number"
                            )));
                        }
                        ops.push(UpdateOp::Inc(path.clone(), v.clone()));
                    }
                }
                k if k.starts_with('$') => {
                    return Err(StoreError::InvalidUpdate(format!("unknown update operator: {k}")));
                }
                _ => {
                    check_path(key)?;
                    ops.push(UpdateOp::Set(key.clone(), value.clone()));
                }
            }
        }

        Ok(Self { ops })
    }

    /// Apply to a copy of `doc`, returning the post-update document.
    ///
    /// `_id` may be set to its current value but never changed or removed.
    pub fn apply(&self, doc: &Document) -> Result<Document, StoreError> {
        let mut updated = doc.clone();

        for op in &self.ops {
            match op {
                UpdateOp::Set(path, value) => {
                    guard_id(doc, path, Some(value))?;
                    set_path(&mut updated, path, value.clone())?;
                }
                UpdateOp::Unset(path) => {
                    guard_id(doc, path, None)?;
                    unset_path(&mut updated, path);
                }
                UpdateOp::Inc(path, delta) => {
                    guard_id(doc, path, None)?;
                    let current = get_path(&updated, path).cloned().unwrap_or(Bson::Int32(0));
                    let sum = add_numbers(&current, delta).ok_or_else(|| {
                        StoreError::InvalidUpdate(format!("cannot apply $inc to non-numeric field '{path}'"))
                    })?;
                    set_path(&mut updated, path, sum)?;
                }
            }
        }

        Ok(updated)
    }
}

fn operator_doc<'a>(op: &str, value: &'a Bson) -> Result<&'a Document, StoreError> {
    match value {
        Bson::Document(d) => Ok(d),
        _ => Err(StoreError::InvalidUpdate(format!("{op} value must be a document"))),
    }
}

fn guard_id(current: &Document, path: &str, value: Option<&Bson>) -> Result<(), StoreError> {
    if path != "_id" && !path.starts_with("_id.") {
        return Ok(());
    }
    match (path, value) {
        ("_id", Some(v)) if current.get("_id") == Some(v) => Ok(()),
        _ => Err(StoreError::ImmutableField("_id".into())),
    }
}

fn is_number(value: &Bson) -> bool {
    matches!(value, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_))
}

fn add_numbers(a: &Bson, b: &Bson) -> Option<Bson> {
    match (a, b) {
        (Bson::Int32(a), Bson::Int32(b)) => Some(match a.checked_add(*b) {
            Some(sum) => Bson::Int32(sum),
            None => Bson::Int64(*a as i64 + *b as i64),
        }),
        (Bson::Int32(a), Bson::Int64(b)) => (*a as i64).checked_add(*b).map(Bson::Int64),
        (Bson::Int64(a), Bson::Int32(b)) => a.checked_add(*b as i64).map(Bson::Int64),
        (Bson::Int64(a), Bson::Int64(b)) => a.checked_add(*b).map(Bson::Int64),
        (Bson::Double(a), Bson::Double(b)) => Some(Bson::Double(a + b)),
        (Bson::Double(a), Bson::Int32(b)) => Some(Bson::Double(a + *b as f64)),
        (Bson::Double(a), Bson::Int64(b)) => Some(Bson::Double(a + *b as f64)),
        (Bson::Int32(a), Bson::Double(b)) => Some(Bson::Double(*a as f64 + b)),
        (Bson::Int64(a), Bson::Double(b)) => Some(Bson::Double(*a as f64 + b)),
        _ => None,
    }
}
