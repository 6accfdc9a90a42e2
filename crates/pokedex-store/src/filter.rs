use std::cmp::Ordering;

use bson::{Bson, Document};
use regex::Regex;

use crate::error::StoreError;
use crate::path::get_path;
use crate::sort::compare_bson;

/// A filter over documents.
///
/// Field names are dot-paths. Values are owned so a filter can be moved into
/// a blocking task independently of the request that built it.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Matches every document (`{}`).
    All,
    /// `{ field: value }`. `null` matches both a missing field and an
    /// explicit null; array fields match if any element is equal.
    Eq(String, Bson),
    /// `{ field: { $regex } }`. Only string values (or string array
    /// elements) can match.
    Regex(String, Regex),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    /// Case-insensitive substring match. `needle` is escaped, so pattern
    /// metacharacters in user input match literally.
    pub fn contains_ignore_case(field: impl Into<String>, needle: &str) -> Result<Self, StoreError> {
        Self::regex(field, &regex::escape(needle), true)
    }

    pub fn regex(
        field: impl Into<String>,
        pattern: &str,
        case_insensitive: bool,
    ) -> Result<Self, StoreError> {
        let full_pattern = if case_insensitive {
            format!("(?i){pattern}")
        } else {
            pattern.to_string()
        };
        let re = Regex::new(&full_pattern)
            .map_err(|e| StoreError::InvalidQuery(format!("invalid regex pattern: {e}")))?;
        Ok(Filter::Regex(field.into(), re))
    }

    /// Evaluate whether a document matches this filter.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, val) => {
                if matches!(val, Bson::Null) {
                    return matches!(get_path(doc, field), None | Some(Bson::Null));
                }
                match get_path(doc, field) {
                    Some(stored @ Bson::Array(arr)) => {
                        arr.iter().any(|elem| value_eq(elem, val)) || value_eq(stored, val)
                    }
                    Some(v) => value_eq(v, val),
                    None => false,
                }
            }
            Filter::Regex(field, re) => match get_path(doc, field) {
                Some(Bson::String(s)) => re.is_match(s),
                Some(Bson::Array(arr)) => arr
                    .iter()
                    .any(|elem| matches!(elem, Bson::String(s) if re.is_match(s))),
                _ => false,
            },
        }
    }
}

/// Equality between a stored value and a query value. Numbers compare by
/// value across int32, int64 and double.
fn value_eq(store_val: &Bson, query_val: &Bson) -> bool {
    match (store_val, query_val) {
        (
            Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_),
            Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_),
        ) => compare_bson(store_val, query_val) == Ordering::Equal,
        _ => store_val == query_val,
    }
}
