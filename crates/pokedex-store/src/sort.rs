use std::cmp::Ordering;

use bson::{Bson, Document};

use crate::path::get_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }
}

/// Stable multi-key sort. Documents that tie on every key keep their
/// relative (insertion) order.
pub(crate) fn apply_sort(docs: &mut [Document], sorts: &[Sort]) {
    if sorts.is_empty() {
        return;
    }
    docs.sort_by(|a, b| {
        for sort in sorts {
            let ord = compare_field_values(get_path(a, &sort.field), get_path(b, &sort.field));
            let ord = match sort.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

/// Missing fields sort with nulls, ahead of everything else.
fn compare_field_values(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let a = a.unwrap_or(&Bson::Null);
    let b = b.unwrap_or(&Bson::Null);
    compare_bson(a, b)
}

/// Cross-type ordering: values of different kinds order by type rank,
/// numbers compare by value regardless of width.
pub(crate) fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }

    match (a, b) {
        // ── Numbers ─────────────────────────────────────────────
        (Bson::Int32(a), Bson::Int32(b)) => a.cmp(b),
        (Bson::Int32(a), Bson::Int64(b)) => (*a as i64).cmp(b),
        (Bson::Int64(a), Bson::Int32(b)) => a.cmp(&(*b as i64)),
        (Bson::Int64(a), Bson::Int64(b)) => a.cmp(b),
        (a, b) if type_rank(a) == 2 => {
            let (a, b) = (as_f64(a), as_f64(b));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }

        (Bson::String(a), Bson::String(b)) => a.cmp(b),
        (Bson::Document(a), Bson::Document(b)) => compare_documents(a, b),
        (Bson::Array(a), Bson::Array(b)) => compare_sequences(a, b),
        (Bson::ObjectId(a), Bson::ObjectId(b)) => a.bytes().cmp(&b.bytes()),
        (Bson::Boolean(a), Bson::Boolean(b)) => a.cmp(b),
        (Bson::DateTime(a), Bson::DateTime(b)) => {
            a.timestamp_millis().cmp(&b.timestamp_millis())
        }
        _ => Ordering::Equal,
    }
}

fn compare_documents(a: &Document, b: &Document) -> Ordering {
    for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
        let ord = ka.cmp(kb).then_with(|| compare_bson(va, vb));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_sequences(a: &[Bson], b: &[Bson]) -> Ordering {
    for (va, vb) in a.iter().zip(b.iter()) {
        let ord = compare_bson(va, vb);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn as_f64(value: &Bson) -> f64 {
    match value {
        Bson::Int32(v) => *v as f64,
        Bson::Int64(v) => *v as f64,
        Bson::Double(v) => *v,
        _ => f64::NAN,
    }
}

fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::MaxKey => 13,
        _ => 12,
    }
}
