use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use shopdb_core::browse;
use shopdb_core::config::{IndexSettings, SearchSettings, Settings};
use shopdb_core::error::{Error, Result};
use shopdb_core::price::ConstraintParser;
use shopdb_core::traits::{CatalogSource, Responder};
use shopdb_core::types::{PriceConstraint, QueryIntent, Record, RetrievalHit};
use shopdb_text::{Retriever, Snapshot};

use crate::router::{no_match_prompt, Dispatch, IntentRouter, PRODUCT_REPLY};
use crate::snapshot::{build_snapshot, SnapshotHandle};

pub const ERROR_APOLOGY: &str = "I am sorry, I am having trouble connecting to the generative AI service right now.";
pub const UNCONFIGURED_REPLY: &str = "I am unable to use the generative AI service at this time. \
I can only provide information based on the available product data.";
pub const EMPTY_APOLOGY: &str =
    "I could not generate a response for that request. Please try phrasing your question differently.";

/// Upper bound on hits collected before paging.
const PAGE_POOL: usize = 1000;

/// Optional filters for [`ShopService::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub category: Option<String>,
    /// Overrides a lower bound parsed from the query.
    pub min_price: Option<f64>,
    /// Overrides an upper bound parsed from the query.
    pub max_price: Option<f64>,
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// 1-based.
    pub page: usize,
    pub per_page: Option<usize>,
    /// Restricts each record to these fields.
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageItem {
    pub score: f32,
    pub category: String,
    pub ordinal: usize,
    pub data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub query: String,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
    pub results: Vec<PageItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub intent: QueryIntent,
    pub reply: String,
    pub results: Vec<RetrievalHit>,
    pub price: PriceConstraint,
}

impl ChatReply {
    fn text(intent: QueryIntent, reply: impl Into<String>) -> Self {
        Self { intent, reply: reply.into(), results: Vec::new(), price: PriceConstraint::UNBOUNDED }
    }
}

/// Caller-facing entry point: structured search, browsing, recommendations
/// and chat over the snapshot currently in service.
pub struct ShopService {
    snapshots: SnapshotHandle,
    retriever: Retriever,
    router: IntentRouter,
    parser: ConstraintParser,
    responder: Box<dyn Responder>,
    search: SearchSettings,
    index: IndexSettings,
}

impl ShopService {
    pub fn new(settings: &Settings, snapshot: Snapshot, responder: Box<dyn Responder>) -> Self {
        let retriever = Retriever::from_settings(&settings.search);
        Self {
            snapshots: SnapshotHandle::new(snapshot),
            retriever,
            router: IntentRouter::new(retriever.parser, settings.chat.top_k),
            parser: retriever.parser,
            responder,
            search: settings.search.clone(),
            index: settings.index.clone(),
        }
    }

    /// Builds the first snapshot from `source`. Fails when no category loads
    /// or the index cannot be built.
    pub fn load(settings: &Settings, source: &dyn CatalogSource, responder: Box<dyn Responder>) -> Result<Self> {
        let snapshot = build_snapshot(source, &settings.index)?;
        info!(documents = snapshot.len(), features = snapshot.index().n_features(), "catalog ready");
        Ok(Self::new(settings, snapshot, responder))
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshots.current()
    }

    /// Rebuilds from `source` and swaps the result in. Returns the new
    /// document count; on failure the current snapshot keeps serving.
    pub fn rebuild(&self, source: &dyn CatalogSource) -> Result<usize> {
        self.snapshots.rebuild(source, &self.index).map(|s| s.len())
    }

    fn constraint(&self, query: &str, params: &SearchParams) -> PriceConstraint {
        self.parser.parse(query).overridden_by(params.min_price, params.max_price)
    }

    /// Ranked hits for `query`, at most `top_k` (default and cap from settings).
    pub fn search(&self, query: &str, params: &SearchParams) -> Vec<RetrievalHit> {
        let top_k = params.top_k.unwrap_or(self.search.default_top_k).min(self.search.max_top_k);
        let snapshot = self.snapshot();
        self.retriever.retrieve_constrained(
            &snapshot,
            query,
            top_k,
            params.category.as_deref(),
            self.constraint(query, params),
        )
    }

    /// Paginated search over up to 1000 hits, optionally projecting fields.
    pub fn search_page(&self, query: &str, params: &SearchParams, request: &PageRequest) -> SearchPage {
        let snapshot = self.snapshot();
        let pool = PAGE_POOL.min(snapshot.len());
        let hits = self.retriever.retrieve_constrained(
            &snapshot,
            query,
            pool,
            params.category.as_deref(),
            self.constraint(query, params),
        );

        let per_page = request.per_page.unwrap_or(self.search.per_page).min(self.search.max_per_page).max(1);
        let page = request.page.max(1);
        let total = hits.len();
        let results = hits
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .map(|hit| PageItem {
                score: hit.score,
                category: hit.record.category.clone(),
                ordinal: hit.record.ordinal,
                data: match &request.fields {
                    Some(fields) => hit.record.project(fields),
                    None => hit.record.project(&field_names(&hit.record)),
                },
            })
            .collect();
        debug!(query, total, page, per_page, "search page");
        SearchPage { query: query.to_string(), page, per_page, total, total_pages: total.div_ceil(per_page), results }
    }

    /// Unranked listing of one category, cheapest first.
    pub fn browse(
        &self,
        category: &str,
        filters: &BTreeMap<String, String>,
        min_price: Option<f64>,
        max_price: Option<f64>,
    ) -> Result<Vec<Arc<Record>>> {
        let snapshot = self.snapshot();
        browse::browse(snapshot.corpus().metadata(), category, filters, PriceConstraint::new(min_price, max_price))
    }

    pub fn recommend(&self, title: &str, top_n: usize) -> Vec<RetrievalHit> {
        self.retriever.recommend(&self.snapshot(), title, top_n)
    }

    /// Routes one chat message. Never fails: responder problems come back as
    /// apology text.
    pub fn chat(&self, message: &str) -> ChatReply {
        let route = self.router.route(message);
        match route.dispatch {
            Dispatch::Canned(reply) => ChatReply::text(route.intent, reply),
            Dispatch::Fallback { prompt } => ChatReply::text(route.intent, self.generate(&prompt)),
            Dispatch::Catalog { price, category, top_k } => {
                let snapshot = self.snapshot();
                let results = self.retriever.retrieve_constrained(&snapshot, message, top_k, category, price);
                if results.is_empty() {
                    info!("no catalog match; using fallback responder");
                    let reply = self.generate(&no_match_prompt(message));
                    return ChatReply { price, ..ChatReply::text(QueryIntent::GeneralOther, reply) };
                }
                ChatReply { intent: route.intent, reply: PRODUCT_REPLY.to_string(), results, price }
            }
        }
    }

    fn generate(&self, prompt: &str) -> String {
        match self.responder.generate(prompt) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("responder returned empty text");
                EMPTY_APOLOGY.to_string()
            }
            Err(Error::ResponderNotConfigured) => {
                debug!("no responder configured");
                UNCONFIGURED_REPLY.to_string()
            }
            Err(e) => {
                warn!(error = %e, "responder failed");
                ERROR_APOLOGY.to_string()
            }
        }
    }
}

fn field_names(record: &Record) -> Vec<String> {
    record.fields.iter().map(|(name, _)| name.clone()).collect()
}
