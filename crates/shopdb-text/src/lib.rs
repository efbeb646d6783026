//! shopdb-text
//!
//! Term-weighted (TF-IDF) indexing and cosine-similarity retrieval over the
//! catalog corpus. Tokenization reuses Tantivy's analyzer pipeline.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::TfidfIndex;
pub use search::{infer_category, Retriever, Snapshot};
