use bson::{Bson, Document};

use crate::error::StoreError;

/// Field names must not start with `$` at any depth; `$` is reserved for
/// query and update operators.
pub fn validate_document(doc: &Document) -> Result<(), StoreError> {
    for (key, value) in doc {
        if key.starts_with('$') {
            return Err(StoreError::InvalidDocument(format!(
                "field name '{key}' must not start with '$'"
            )));
        }
        validate_bson(value)?;
    }
    Ok(())
}

fn validate_bson(value: &Bson) -> Result<(), StoreError> {
    match value {
        Bson::Document(doc) => validate_document(doc),
        Bson::Array(arr) => {
            for item in arr {
                validate_bson(item)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
