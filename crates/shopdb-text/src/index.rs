use std::collections::{BTreeMap, HashMap};

use tantivy::tokenizer::TextAnalyzer;
use tracing::{debug, info};

use shopdb_core::config::IndexSettings;
use shopdb_core::corpus::Corpus;
use shopdb_core::error::{Error, Result};

use crate::tantivy_utils::{build_analyzer, ngram_terms};

/// Sparse L2-normalized weight vector: `(column, weight)` sorted by column.
pub type SparseVec = Vec<(u32, f32)>;

/// Fitted TF-IDF model plus one weight row per corpus document.
///
/// Weights are `(1 + ln tf) * idf` with smoothed
/// `idf = ln((1 + n) / (1 + df)) + 1`, then L2-normalized per row, so the
/// cosine similarity of two rows is their dot product. Built once and never
/// mutated.
pub struct TfidfIndex {
    analyzer: TextAnalyzer,
    max_ngram: usize,
    vocabulary: HashMap<String, u32>,
    terms: Vec<String>,
    idf: Vec<f32>,
    doc_freq: Vec<u32>,
    rows: Vec<SparseVec>,
}

impl std::fmt::Debug for TfidfIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfidfIndex").field("documents", &self.rows.len()).field("features", &self.terms.len()).finish()
    }
}

fn count_terms(analyzer: &TextAnalyzer, text: &str, max_ngram: usize) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for term in ngram_terms(analyzer, text, max_ngram) {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

fn sublinear_tf(tf: u32) -> f64 {
    1.0 + f64::from(tf).ln()
}

/// Normalizes `(column, weight)` pairs to unit length, sorted by column.
fn normalize(mut row: Vec<(u32, f64)>) -> SparseVec {
    row.sort_by_key(|(col, _)| *col);
    let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm == 0.0 {
        return Vec::new();
    }
    row.into_iter().map(|(col, w)| (col, (w / norm) as f32)).collect()
}

impl TfidfIndex {
    /// Fits the vocabulary and weights over `corpus`.
    ///
    /// A term is kept when it occurs in at least `min_df` documents and in at
    /// most `max_df * n` documents. When more than `max_features` survive,
    /// those with the highest corpus-wide term count are kept (ties by term).
    /// Fails with [`Error::IndexBuild`] on an empty corpus or an empty vocabulary.
    pub fn build(corpus: &Corpus, settings: &IndexSettings) -> Result<Self> {
        if corpus.is_empty() {
            return Err(Error::IndexBuild("corpus is empty".into()));
        }
        let analyzer = build_analyzer()?;
        let max_ngram = settings.max_ngram.max(1);
        let n_docs = corpus.len();

        let doc_counts: Vec<HashMap<String, u32>> =
            corpus.texts().map(|text| count_terms(&analyzer, text, max_ngram)).collect();

        // term -> (document frequency, total count)
        let mut stats: BTreeMap<&str, (u32, u64)> = BTreeMap::new();
        for counts in &doc_counts {
            for (term, tf) in counts {
                let entry = stats.entry(term.as_str()).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += u64::from(*tf);
            }
        }

        let max_doc_count = settings.max_df * n_docs as f64;
        let mut kept: Vec<(&str, u32, u64)> = stats
            .into_iter()
            .filter(|(_, (df, _))| *df as usize >= settings.min_df && f64::from(*df) <= max_doc_count)
            .map(|(term, (df, total))| (term, df, total))
            .collect();

        if kept.len() > settings.max_features {
            kept.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(b.0)));
            kept.truncate(settings.max_features);
            kept.sort_by(|a, b| a.0.cmp(b.0));
        }
        if kept.is_empty() {
            return Err(Error::IndexBuild(format!(
                "no terms remain after pruning ({} documents, min_df={}, max_df={})",
                n_docs, settings.min_df, settings.max_df
            )));
        }

        let terms: Vec<String> = kept.iter().map(|(t, _, _)| (*t).to_string()).collect();
        let doc_freq: Vec<u32> = kept.iter().map(|(_, df, _)| *df).collect();
        let n = n_docs as f64;
        let idf_f64: Vec<f64> = doc_freq.iter().map(|&df| ((1.0 + n) / (1.0 + f64::from(df))).ln() + 1.0).collect();
        let vocabulary: HashMap<String, u32> =
            terms.iter().enumerate().map(|(i, t)| (t.clone(), i as u32)).collect();

        let rows: Vec<SparseVec> = doc_counts
            .iter()
            .map(|counts| {
                let row = counts
                    .iter()
                    .filter_map(|(term, tf)| {
                        vocabulary.get(term).map(|&col| (col, sublinear_tf(*tf) * idf_f64[col as usize]))
                    })
                    .collect();
                normalize(row)
            })
            .collect();

        let empty_rows = rows.iter().filter(|r| r.is_empty()).count();
        if empty_rows > 0 {
            debug!(empty_rows, "documents without any indexed term");
        }
        info!(documents = n_docs, features = terms.len(), "TF-IDF index built");

        Ok(Self {
            analyzer,
            max_ngram,
            vocabulary,
            terms,
            idf: idf_f64.into_iter().map(|v| v as f32).collect(),
            doc_freq,
            rows,
        })
    }

    pub fn n_docs(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.terms.len()
    }

    /// Indexed terms, ordered by column id.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn column(&self, term: &str) -> Option<u32> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.column(term).map(|c| self.idf[c as usize])
    }

    pub fn doc_freq(&self, term: &str) -> Option<u32> {
        self.column(term).map(|c| self.doc_freq[c as usize])
    }

    pub fn row(&self, doc_id: usize) -> Option<&SparseVec> {
        self.rows.get(doc_id)
    }

    /// Projects free text into the index space with the fitted tokenizer and
    /// vocabulary. Out-of-vocabulary terms are dropped; text with no known
    /// term yields an empty (zero) vector.
    pub fn embed(&self, text: &str) -> SparseVec {
        let counts = count_terms(&self.analyzer, text, self.max_ngram);
        let row = counts
            .iter()
            .filter_map(|(term, tf)| {
                self.vocabulary.get(term).map(|&col| (col, sublinear_tf(*tf) * f64::from(self.idf[col as usize])))
            })
            .collect();
        normalize(row)
    }

    /// Cosine similarity of `query` against every document, indexed by doc id.
    pub fn similarities(&self, query: &SparseVec) -> Vec<f32> {
        if query.is_empty() {
            return vec![0.0; self.rows.len()];
        }
        let mut dense = vec![0f32; self.terms.len()];
        for &(col, w) in query {
            dense[col as usize] = w;
        }
        self.rows
            .iter()
            .map(|row| row.iter().map(|&(col, w)| w * dense[col as usize]).sum::<f32>().clamp(0.0, 1.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopdb_core::corpus::build_corpus;
    use shopdb_core::types::{FieldValue, Record};

    fn corpus(names: &[&str]) -> Corpus {
        build_corpus(names.iter().enumerate().map(|(i, name)| Record {
            category: "headphone".into(),
            ordinal: i,
            fields: vec![("model".into(), FieldValue::Text((*name).into()))],
        }))
    }

    #[test]
    fn rows_are_unit_length() {
        let c = corpus(&["sony buds", "sony wired", "boat buds", "boat bass"]);
        let index = TfidfIndex::build(&c, &IndexSettings::default()).expect("index");
        for doc_id in 0..index.n_docs() {
            let norm: f32 = index.row(doc_id).expect("row").iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5, "row {doc_id} norm {norm}");
        }
    }

    #[test]
    fn prunes_rare_and_universal_terms() {
        let c = corpus(&["sony buds", "sony wired", "boat buds", "boat bass"]);
        let index = TfidfIndex::build(&c, &IndexSettings::default()).expect("index");
        // in every document
        assert!(index.column("headphone").is_none());
        assert!(index.column("model").is_none());
        // in one document only
        assert!(index.column("wired").is_none());
        assert_eq!(index.doc_freq("sony"), Some(2));
        assert!(index.column("buds").is_some());
    }

    #[test]
    fn caps_vocabulary_by_total_count() {
        let c = corpus(&["sony buds", "sony wired", "boat buds", "boat bass"]);
        let settings = IndexSettings { max_features: 1, ..IndexSettings::default() };
        let index = TfidfIndex::build(&c, &settings).expect("index");
        assert_eq!(index.n_features(), 1);
    }

    #[test]
    fn degenerate_corpus_fails() {
        assert!(matches!(TfidfIndex::build(&corpus(&[]), &IndexSettings::default()), Err(Error::IndexBuild(_))));
        assert!(matches!(TfidfIndex::build(&corpus(&["solo"]), &IndexSettings::default()), Err(Error::IndexBuild(_))));
    }

    #[test]
    fn unknown_query_embeds_to_zero() {
        let c = corpus(&["sony buds", "sony wired", "boat buds", "boat bass"]);
        let index = TfidfIndex::build(&c, &IndexSettings::default()).expect("index");
        let q = index.embed("zzzz qqqq");
        assert!(q.is_empty());
        assert!(index.similarities(&q).iter().all(|s| *s == 0.0));
    }
}
