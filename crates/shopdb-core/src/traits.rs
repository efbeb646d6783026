use crate::catalog::RawTable;
use crate::error::Result;

/// Supplies raw per-category tables to the normalizer.
///
/// The outer `Result` fails only when the source as a whole is unusable;
/// a single unreadable category is reported in its own entry.
pub trait CatalogSource: Send + Sync {
    fn tables(&self) -> Result<Vec<(String, Result<RawTable>)>>;
}

/// External text generator used when the catalog cannot answer.
///
/// Implementations may fail or return empty text; callers must tolerate both.
pub trait Responder: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}

impl<R: Responder + ?Sized> Responder for Box<R> {
    fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt)
    }
}
