use crate::filter::Filter;
use crate::sort::Sort;

/// A find request: filter, then sort, then skip, then limit.
///
/// `skip` and `limit` are signed to mirror the wire protocol of document
/// databases: a negative skip is rejected by the store, a negative limit
/// returns at most `|limit|` documents, and a zero limit means no limit.
#[derive(Debug, Clone)]
pub struct FindQuery {
    pub filter: Filter,
    pub sort: Vec<Sort>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl Default for FindQuery {
    fn default() -> Self {
        Self {
            filter: Filter::All,
            sort: Vec::new(),
            skip: None,
            limit: None,
        }
    }
}
