//! Price handling: constraint extraction from free-text queries and price
//! extraction from catalog records.
//!
//! The query parser is conservative. A bare number with no qualifying keyword
//! or range shape is never read as a price bound, so "16gb ram" or "iphone 15"
//! leave the constraint empty.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::{PriceConstraint, Record};

static BETWEEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"between\s+(\d[\d,]*)\s*(?:and|-)\s*(\d[\d,]*)").expect("between regex is valid")
});
static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d,]*)\s*-\s*(\d[\d,]*)").expect("range regex is valid"));
static UPPER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:under|below|less than|max|maximum)\s*(?:₹|\$|rs\.?)?\s*(\d[\d,]*)")
        .expect("upper bound regex is valid")
});
static LOWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:over|above|more than|min|minimum)\s*(?:₹|\$|rs\.?)?\s*(\d[\d,]*)")
        .expect("lower bound regex is valid")
});

/// Minimum digits per side a bare `A-B` range needs when strict ranges are on.
const STRICT_RANGE_DIGITS: usize = 3;

/// Extracts [`PriceConstraint`]s from queries.
///
/// Patterns are tried in priority order and the first match wins:
/// `between A and B`, bare `A - B`, `under N` family, `over N` family.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintParser {
    /// Reject bare `A-B` ranges unless both sides have at least three digits.
    /// Keeps short model-number ranges such as "13-14" from becoming prices.
    pub strict_ranges: bool,
}

impl ConstraintParser {
    pub fn new(strict_ranges: bool) -> Self {
        Self { strict_ranges }
    }

    pub fn parse(&self, query: &str) -> PriceConstraint {
        let q = query.to_lowercase();

        if let Some(c) = BETWEEN_RE.captures(&q).and_then(|m| range(&m[1], &m[2])) {
            return c;
        }

        for m in RANGE_RE.captures_iter(&q) {
            if self.strict_ranges && !(digits(&m[1]) >= STRICT_RANGE_DIGITS && digits(&m[2]) >= STRICT_RANGE_DIGITS) {
                continue;
            }
            if let Some(c) = range(&m[1], &m[2]) {
                return c;
            }
        }

        if let Some(max) = UPPER_RE.captures(&q).and_then(|m| number(&m[1])) {
            return PriceConstraint::new(None, Some(max));
        }
        if let Some(min) = LOWER_RE.captures(&q).and_then(|m| number(&m[1])) {
            return PriceConstraint::new(Some(min), None);
        }

        PriceConstraint::UNBOUNDED
    }
}

/// Parses with the default (non-strict) parser.
pub fn parse_price_constraint(query: &str) -> PriceConstraint {
    ConstraintParser::default().parse(query)
}

fn number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

fn digits(raw: &str) -> usize {
    raw.chars().filter(char::is_ascii_digit).count()
}

fn range(a: &str, b: &str) -> Option<PriceConstraint> {
    let (a, b) = (number(a)?, number(b)?);
    Some(PriceConstraint::new(Some(a.min(b)), Some(a.max(b))))
}

/// Numeric price of a record.
///
/// Scans fields in column order for names containing "price"
/// (case-insensitive), strips everything but digits and '.', and returns the
/// first value that parses. `None` when no price field yields a number.
pub fn extract_price(record: &Record) -> Option<f64> {
    record
        .fields
        .iter()
        .filter(|(name, _)| name.to_lowercase().contains("price"))
        .filter_map(|(_, value)| value.as_text())
        .find_map(|text| {
            let cleaned: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse::<f64>().ok()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldValue;

    fn parse(q: &str) -> (Option<f64>, Option<f64>) {
        let c = parse_price_constraint(q);
        (c.min, c.max)
    }

    #[test]
    fn under_with_grouping_separator() {
        assert_eq!(parse("under 2,000"), (None, Some(2000.0)));
        assert_eq!(parse("laptop under 50000"), (None, Some(50000.0)));
        assert_eq!(parse("phones below ₹15,000"), (None, Some(15000.0)));
        assert_eq!(parse("Maximum 900"), (None, Some(900.0)));
    }

    #[test]
    fn between_orders_bounds() {
        assert_eq!(parse("between 1000 and 3000"), (Some(1000.0), Some(3000.0)));
        assert_eq!(parse("phone between 20000 and 10000"), (Some(10000.0), Some(20000.0)));
        assert_eq!(parse("between 1,000 - 3,000"), (Some(1000.0), Some(3000.0)));
    }

    #[test]
    fn bare_range() {
        assert_eq!(parse("headphones 1500 - 2500"), (Some(1500.0), Some(2500.0)));
        assert_eq!(parse("5000-2000 laptop"), (Some(2000.0), Some(5000.0)));
    }

    #[test]
    fn lower_bound() {
        assert_eq!(parse("above 500"), (Some(500.0), None));
        assert_eq!(parse("laptop more than 30000"), (Some(30000.0), None));
        assert_eq!(parse("minimum rs. 700"), (Some(700.0), None));
    }

    #[test]
    fn range_beats_keywords() {
        assert_eq!(parse("under 5000 or 1000-2000"), (Some(1000.0), Some(2000.0)));
    }

    #[test]
    fn bare_numbers_are_not_prices() {
        assert_eq!(parse("show me a laptop"), (None, None));
        assert_eq!(parse("laptop with 16 gb ram"), (None, None));
        assert_eq!(parse("iphone 15"), (None, None));
    }

    #[test]
    fn strict_ranges_reject_short_ranges() {
        let strict = ConstraintParser::new(true);
        assert_eq!(parse("iphone 13-14"), (Some(13.0), Some(14.0)));
        assert_eq!(strict.parse("iphone 13-14"), PriceConstraint::UNBOUNDED);
        assert_eq!(strict.parse("phones 10000-20000"), PriceConstraint::new(Some(10000.0), Some(20000.0)));
        // a rejected short range does not hide a later keyword bound
        assert_eq!(strict.parse("iphone 13-14 under 60000"), PriceConstraint::new(None, Some(60000.0)));
    }

    fn record(fields: Vec<(&str, FieldValue)>) -> Record {
        Record {
            category: "mobile".into(),
            ordinal: 0,
            fields: fields.into_iter().map(|(n, v)| (n.to_string(), v)).collect(),
        }
    }

    #[test]
    fn extract_price_cleans_symbols() {
        let r = record(vec![
            ("model", FieldValue::Text("X".into())),
            ("selling_price", FieldValue::Text("₹1,299.00".into())),
        ]);
        assert_eq!(extract_price(&r), Some(1299.0));
    }

    #[test]
    fn extract_price_skips_unparseable_fields() {
        let r = record(vec![
            ("original_price", FieldValue::Text("N/A".into())),
            ("discount_price", FieldValue::Text("1.2.3".into())),
            ("Price", FieldValue::Number(4999.0)),
        ]);
        assert_eq!(extract_price(&r), Some(4999.0));
        assert_eq!(extract_price(&record(vec![("brand", FieldValue::Text("Boat".into()))])), None);
    }
}
