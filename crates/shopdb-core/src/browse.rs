//! Structured catalog browsing without text ranking.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{PriceConstraint, Record};

/// Records of `category` whose fields equal every filter value
/// (case-insensitive) and whose price passes `price`.
///
/// Results are ordered by ascending price; records without a price sort last.
/// Ties keep input order. Filters naming a column the record does not have
/// are ignored; a present column with a missing value never matches.
pub fn browse(
    records: &[Arc<Record>],
    category: &str,
    filters: &BTreeMap<String, String>,
    price: PriceConstraint,
) -> Result<Vec<Arc<Record>>> {
    if !records.iter().any(|r| r.category == category) {
        let mut known: Vec<String> = records.iter().map(|r| r.category.clone()).collect();
        known.sort();
        known.dedup();
        return Err(Error::UnknownCategory { category: category.to_string(), known });
    }

    let mut hits: Vec<(Option<f64>, Arc<Record>)> = records
        .iter()
        .filter(|r| r.category == category)
        .filter(|r| {
            filters.iter().all(|(field, wanted)| {
                r.get(field).is_none()
                    || r.text(field).is_some_and(|v| v.to_lowercase() == wanted.trim().to_lowercase())
            })
        })
        .map(|r| (r.price(), Arc::clone(r)))
        .filter(|(p, _)| price.admits(*p))
        .collect();

    hits.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    Ok(hits.into_iter().map(|(_, r)| r).collect())
}
