//! JSON array files of documents: seed files and the memory store's data file.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bson::Document;

use crate::error::StoreError;

/// Read a JSON array of objects.
pub fn load_documents(path: &Path) -> Result<Vec<Document>, StoreError> {
    let reader = BufReader::new(File::open(path)?);
    let docs: Vec<Document> = serde_json::from_reader(reader)?;
    Ok(docs)
}

/// Write documents as a JSON array, replacing `path` atomically.
pub(crate) fn write_documents<'a>(
    path: &Path,
    docs: impl Iterator<Item = &'a Document>,
) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");
    {
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);
        let docs: Vec<&Document> = docs.collect();
        serde_json::to_writer(&mut writer, &docs)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
