use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use shopdb_core::config::{IndexSettings, SearchSettings};
use shopdb_core::corpus::Corpus;
use shopdb_core::error::Result;
use shopdb_core::price::ConstraintParser;
use shopdb_core::types::{DocId, PriceConstraint, RetrievalHit};

use crate::index::TfidfIndex;

/// Keyword groups used to guess a category when the caller gave none.
/// Checked in order; the first group with a matching substring wins.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("headphone", &["headphone", "headset", "earbud"]),
    ("mobile", &["mobile", "smartphone", "phone"]),
    ("laptop", &["laptop", "notebook", "pc"]),
];

/// Advisory category hint for a query, if any keyword group matches.
pub fn infer_category(query: &str) -> Option<&'static str> {
    let q = query.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| q.contains(w)))
        .map(|(category, _)| *category)
}

/// One consistent corpus + index pair. The only way to obtain an index for
/// retrieval is through a snapshot, so doc ids always address this corpus.
#[derive(Debug)]
pub struct Snapshot {
    corpus: Corpus,
    index: TfidfIndex,
}

impl Snapshot {
    pub fn build(corpus: Corpus, settings: &IndexSettings) -> Result<Self> {
        let index = TfidfIndex::build(&corpus, settings)?;
        Ok(Self { corpus, index })
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn index(&self) -> &TfidfIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    /// Doc ids ranked by descending similarity to `text`, with scores.
    /// Equal scores keep ascending doc-id order (stable sort), which is an
    /// artifact of sort stability rather than a guaranteed secondary key.
    pub fn rank(&self, text: &str) -> Vec<(DocId, f32)> {
        let query = self.index.embed(text);
        let sims = self.index.similarities(&query);
        let mut order: Vec<DocId> = (0..sims.len()).collect();
        order.sort_by(|&a, &b| sims[b].partial_cmp(&sims[a]).unwrap_or(Ordering::Equal));
        order.into_iter().map(|d| (d, sims[d])).collect()
    }

    fn hit(&self, doc_id: DocId, score: f32) -> Option<RetrievalHit> {
        self.corpus.record(doc_id).map(|record| RetrievalHit { score, doc_id, record: Arc::clone(record) })
    }
}

/// Ranks snapshot documents for a query and applies category/price filters.
#[derive(Debug, Clone, Copy)]
pub struct Retriever {
    pub candidate_pool: usize,
    pub min_score: f32,
    pub recommend_min_score: f32,
    pub parser: ConstraintParser,
}

impl Default for Retriever {
    fn default() -> Self {
        Self::from_settings(&SearchSettings::default())
    }
}

impl Retriever {
    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self {
            candidate_pool: settings.candidate_pool,
            min_score: settings.min_score,
            recommend_min_score: settings.recommend_min_score,
            parser: ConstraintParser::new(settings.strict_ranges),
        }
    }

    /// Retrieval with the price constraint parsed from the query itself.
    pub fn retrieve(
        &self,
        snapshot: &Snapshot,
        query: &str,
        top_k: usize,
        category: Option<&str>,
    ) -> Vec<RetrievalHit> {
        let price = self.parser.parse(query);
        self.retrieve_constrained(snapshot, query, top_k, category, price)
    }

    /// Returns at most `top_k` hits in descending score order.
    ///
    /// Candidates are the best `candidate_pool` documents scoring at least
    /// `min_score`; these are filtered, in rank order, by category (explicit,
    /// else inferred from the query) and by `price`.
    pub fn retrieve_constrained(
        &self,
        snapshot: &Snapshot,
        query: &str,
        top_k: usize,
        category: Option<&str>,
        price: PriceConstraint,
    ) -> Vec<RetrievalHit> {
        if top_k == 0 {
            return Vec::new();
        }
        let category = category.filter(|c| !c.is_empty()).or_else(|| infer_category(query));
        debug!(query, ?category, ?price, top_k, "retrieving");

        let mut hits = Vec::new();
        for (doc_id, score) in snapshot.rank(query).into_iter().take(self.candidate_pool) {
            if score < self.min_score {
                continue;
            }
            let Some(hit) = snapshot.hit(doc_id, score) else { continue };
            if category.is_some_and(|c| hit.record.category != c) {
                continue;
            }
            if !price.admits(hit.record.price()) {
                continue;
            }
            hits.push(hit);
            if hits.len() >= top_k {
                break;
            }
        }
        hits
    }

    /// Products similar to the one named by `title`.
    ///
    /// The first record whose name/model/title value appears in `title`
    /// (case-insensitive) is treated as the product itself and excluded.
    pub fn recommend(&self, snapshot: &Snapshot, title: &str, top_n: usize) -> Vec<RetrievalHit> {
        let title_lower = title.to_lowercase();
        let own = snapshot.corpus().metadata().iter().position(|r| {
            r.display_name().is_some_and(|name| title_lower.contains(&name.to_lowercase()))
        });

        snapshot
            .rank(title)
            .into_iter()
            .filter(|(doc_id, score)| Some(*doc_id) != own && *score > self.recommend_min_score)
            .filter_map(|(doc_id, score)| snapshot.hit(doc_id, score))
            .take(top_n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_category_from_keywords() {
        assert_eq!(infer_category("Best EARBUDS for gym"), Some("headphone"));
        assert_eq!(infer_category("budget smartphone"), Some("mobile"));
        assert_eq!(infer_category("gaming laptop"), Some("laptop"));
        // headphone wins over the "phone" substring
        assert_eq!(infer_category("wireless headphones"), Some("headphone"));
        assert_eq!(infer_category("something nice"), None);
    }
}
