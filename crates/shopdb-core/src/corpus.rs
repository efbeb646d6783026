//! Corpus construction: one weighted text document per catalog record.
//!
//! Weighting is done by repetition. The category tag is written three times
//! and values of "important" fields three times, so those terms dominate the
//! term-frequency component of the index over boilerplate such as units.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::types::{DocId, Document, Record};

const CATEGORY_REPEAT: usize = 3;
const IMPORTANT_REPEAT: usize = 3;

/// Field-name fragments whose values are boosted. Matched as substrings of
/// the lower-cased field name, so `processor_name` and `ram_gb` qualify.
pub const IMPORTANT_FIELDS: &[&str] = &[
    "name", "model", "brand", "title", "processor", "ram", "storage", "memory", "display", "camera", "battery", "os",
];

/// Ordered documents plus the records they were built from.
///
/// `documents[i]` was built from `metadata[i]`; `i` is the document's
/// [`DocId`]. Both vectors are private so the pairing cannot drift.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    metadata: Vec<Arc<Record>>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn metadata(&self) -> &[Arc<Record>] {
        &self.metadata
    }

    pub fn document(&self, doc_id: DocId) -> Option<&Document> {
        self.documents.get(doc_id)
    }

    pub fn record(&self, doc_id: DocId) -> Option<&Arc<Record>> {
        self.metadata.get(doc_id)
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.text.as_str())
    }

    pub fn categories(&self) -> Vec<String> {
        let cats: std::collections::BTreeSet<&str> = self.metadata.iter().map(|r| r.category.as_str()).collect();
        cats.into_iter().map(str::to_string).collect()
    }
}

fn is_important(field: &str) -> bool {
    let field = field.to_lowercase();
    IMPORTANT_FIELDS.iter().any(|imp| field.contains(imp))
}

/// Weighted text for a single record.
pub fn document_text(record: &Record) -> String {
    let mut parts: Vec<String> = vec![record.category.clone(); CATEGORY_REPEAT];
    for (name, value) in &record.fields {
        let Some(text) = value.as_text() else { continue };
        parts.push(name.clone());
        let weight = if is_important(name) { IMPORTANT_REPEAT } else { 1 };
        parts.extend(std::iter::repeat(text).take(weight));
    }
    parts.join(" ")
}

/// Builds documents in record order: categories sorted, rows in table order.
/// Identical input therefore always yields identical doc ids.
pub fn build_corpus<I>(records: I) -> Corpus
where
    I: IntoIterator<Item = Record>,
{
    let mut corpus = Corpus::default();
    for record in records {
        corpus.documents.push(Document {
            text: document_text(&record),
            category: record.category.clone(),
            ordinal: record.ordinal,
        });
        corpus.metadata.push(Arc::new(record));
    }
    corpus
}

impl From<Catalog> for Corpus {
    fn from(catalog: Catalog) -> Self {
        build_corpus(catalog.into_records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldValue;

    fn laptop() -> Record {
        Record {
            category: "laptop".into(),
            ordinal: 4,
            fields: vec![
                ("brand".into(), FieldValue::Text("Dell".into())),
                ("weight".into(), FieldValue::Text("1.2 kg".into())),
                ("os".into(), FieldValue::Missing),
                ("price".into(), FieldValue::Number(45990.0)),
            ],
        }
    }

    #[test]
    fn repeats_category_and_important_values() {
        let text = document_text(&laptop());
        assert_eq!(text, "laptop laptop laptop brand Dell Dell Dell weight 1.2 kg price 45990");
    }

    #[test]
    fn substring_match_marks_important() {
        assert!(is_important("processor_name"));
        assert!(is_important("Screen_Display"));
        assert!(!is_important("price"));
    }

    #[test]
    fn metadata_stays_aligned() {
        let mut second = laptop();
        second.ordinal = 5;
        second.category = "mobile".into();
        let corpus = build_corpus(vec![laptop(), second]);
        assert_eq!(corpus.len(), corpus.metadata().len());
        for (doc_id, doc) in corpus.documents().iter().enumerate() {
            let rec = corpus.record(doc_id).expect("record");
            assert_eq!((doc.category.as_str(), doc.ordinal), (rec.category.as_str(), rec.ordinal));
        }
    }
}
