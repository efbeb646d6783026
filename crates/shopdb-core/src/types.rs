//! Domain types shared by the corpus, index, retrieval and chat layers.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Position of a document within one corpus/index snapshot.
pub type DocId = usize;

/// A single scalar cell of a catalog table.
///
/// Serializes as `null`, a JSON number, or a JSON string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Missing,
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Types a raw CSV cell. Blank cells and the usual "not available"
    /// markers become `Missing`; finite numbers become `Number`. Words such
    /// as "Infinity" stay `Text` even though `f64` parses them.
    pub fn parse(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.is_empty() || matches!(cell, "nan" | "NaN" | "NAN" | "N/A" | "n/a" | "NA") {
            return FieldValue::Missing;
        }
        match cell.parse::<f64>() {
            Ok(n) if n.is_finite() => FieldValue::Number(n),
            _ => FieldValue::Text(cell.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            FieldValue::Missing => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) => false,
        }
    }

    /// Rendered, trimmed text of a present value.
    pub fn as_text(&self) -> Option<String> {
        if self.is_missing() {
            return None;
        }
        Some(self.to_string().trim().to_string())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Missing => Ok(()),
            // integral values print without a trailing ".0"
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// One catalog item, immutable once loaded.
///
/// - `category`: table the row came from (e.g. "laptop")
/// - `ordinal`: row position within that table
/// - `fields`: normalized column name → value, in source column order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub category: String,
    pub ordinal: usize,
    #[serde(serialize_with = "fields_as_map")]
    pub fields: Vec<(String, FieldValue)>,
}

fn fields_as_map<S: Serializer>(fields: &[(String, FieldValue)], s: S) -> Result<S::Ok, S::Error> {
    let mut map = s.serialize_map(Some(fields.len()))?;
    for (name, value) in fields {
        map.serialize_entry(name, value)?;
    }
    map.end()
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Present (non-missing) text of a field.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).and_then(FieldValue::as_text)
    }

    /// Display name: the first present `name`/`model`/`title` field.
    pub fn display_name(&self) -> Option<String> {
        ["name", "model", "title"].iter().find_map(|f| self.text(f))
    }

    pub fn price(&self) -> Option<f64> {
        crate::price::extract_price(self)
    }

    /// One-line human summary, e.g. `Category: laptop | Brand: Dell | Product: XPS 13 | Price: 99990`.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("Category: {}", self.category)];
        if let Some(brand) = self.text("brand") {
            parts.push(format!("Brand: {brand}"));
        }
        let name = self
            .display_name()
            .or_else(|| self.fields.iter().find_map(|(_, v)| v.as_text()));
        if let Some(name) = name {
            parts.push(format!("Product: {name}"));
        }
        let price = self
            .fields
            .iter()
            .find(|(n, v)| n.to_lowercase().contains("price") && !v.is_missing())
            .and_then(|(_, v)| v.as_text());
        if let Some(price) = price {
            parts.push(format!("Price: {price}"));
        }
        parts.join(" | ")
    }

    /// JSON object restricted to the requested fields; absent names are skipped.
    pub fn project(&self, names: &[String]) -> serde_json::Map<String, serde_json::Value> {
        let mut out = serde_json::Map::new();
        for name in names {
            if let Some(value) = self.get(name) {
                out.insert(name.clone(), serde_json::to_value(value).unwrap_or(serde_json::Value::Null));
            }
        }
        out
    }
}

/// Weighted text of one record plus the address of that record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub text: String,
    pub category: String,
    pub ordinal: usize,
}

/// Inclusive price bounds; `None` on a side means unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriceConstraint {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceConstraint {
    pub const UNBOUNDED: PriceConstraint = PriceConstraint { min: None, max: None };

    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    /// Whether a record with this extracted price passes the filter.
    /// A record without a price only passes an inactive filter.
    pub fn admits(&self, price: Option<f64>) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(p) = price else { return false };
        self.min.map_or(true, |min| p >= min) && self.max.map_or(true, |max| p <= max)
    }

    /// Replaces each side that is given explicitly.
    pub fn overridden_by(self, min: Option<f64>, max: Option<f64>) -> Self {
        Self { min: min.or(self.min), max: max.or(self.max) }
    }
}

/// Outcome of intent routing for a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    Greeting,
    Farewell,
    Thanks,
    HelpRequest,
    IdentityQuestion,
    ProductQuery,
    GeneralOther,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::Greeting => "greeting",
            QueryIntent::Farewell => "farewell",
            QueryIntent::Thanks => "thanks",
            QueryIntent::HelpRequest => "help_request",
            QueryIntent::IdentityQuestion => "identity_question",
            QueryIntent::ProductQuery => "product_query",
            QueryIntent::GeneralOther => "general_other",
        }
    }
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked retrieval result. `score` is a cosine similarity in `[0, 1]`;
/// higher is better. Produced fresh per query.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalHit {
    pub score: f32,
    pub doc_id: DocId,
    pub record: Arc<Record>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, FieldValue)]) -> Record {
        Record {
            category: "laptop".to_string(),
            ordinal: 0,
            fields: fields.iter().map(|(n, v)| (n.to_string(), v.clone())).collect(),
        }
    }

    #[test]
    fn parse_types_cells() {
        assert_eq!(FieldValue::parse("  "), FieldValue::Missing);
        assert_eq!(FieldValue::parse("NaN"), FieldValue::Missing);
        assert_eq!(FieldValue::parse("45990"), FieldValue::Number(45990.0));
        assert_eq!(FieldValue::parse(" 8 GB "), FieldValue::Text("8 GB".to_string()));
    }

    #[test]
    fn non_finite_words_stay_text() {
        assert_eq!(FieldValue::parse("Infinity"), FieldValue::Text("Infinity".to_string()));
        assert_eq!(FieldValue::parse("inf"), FieldValue::Text("inf".to_string()));
        assert_eq!(FieldValue::parse("-INF").as_text().as_deref(), Some("-INF"));
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(FieldValue::Number(45990.0).to_string(), "45990");
        assert_eq!(FieldValue::Number(6.5).to_string(), "6.5");
    }

    #[test]
    fn missing_serializes_as_null() {
        let r = record(&[("brand", FieldValue::Text("Dell".into())), ("os", FieldValue::Missing)]);
        let json = serde_json::to_value(&r).expect("serialize");
        assert_eq!(json["fields"]["brand"], "Dell");
        assert!(json["fields"]["os"].is_null());
    }

    #[test]
    fn summary_skips_absent_parts() {
        let r = record(&[
            ("brand", FieldValue::Text("Dell".into())),
            ("model", FieldValue::Text("XPS 13".into())),
            ("price", FieldValue::Number(99990.0)),
        ]);
        assert_eq!(r.summary(), "Category: laptop | Brand: Dell | Product: XPS 13 | Price: 99990");

        let bare = record(&[("colour", FieldValue::Text("Black".into()))]);
        assert_eq!(bare.summary(), "Category: laptop | Product: Black");
    }

    #[test]
    fn constraint_admits_inclusive_bounds() {
        let c = PriceConstraint::new(Some(1000.0), Some(3000.0));
        assert!(c.admits(Some(1000.0)));
        assert!(c.admits(Some(3000.0)));
        assert!(!c.admits(Some(3000.5)));
        assert!(!c.admits(None));
        assert!(PriceConstraint::UNBOUNDED.admits(None));
    }

    #[test]
    fn explicit_bounds_override_per_side() {
        let parsed = PriceConstraint::new(None, Some(50000.0));
        let merged = parsed.overridden_by(Some(100.0), None);
        assert_eq!(merged, PriceConstraint::new(Some(100.0), Some(50000.0)));
    }
}
