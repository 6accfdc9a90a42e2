mod error;
mod filter;
mod memory;
mod path;
mod query;
mod snapshot;
mod sort;
mod store;
mod update;
mod validate;

pub use bson::{Bson, Document, doc};
pub use error::StoreError;
pub use filter::Filter;
pub use memory::MemoryStore;
pub use path::get_path;
pub use query::FindQuery;
pub use snapshot::load_documents;
pub use sort::{Sort, SortDirection};
pub use store::DocumentStore;
pub use update::{Update, UpdateOp};
pub use validate::validate_document;
