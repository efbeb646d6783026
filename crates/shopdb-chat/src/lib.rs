//! shopdb-chat
//!
//! Intent routing, the shared snapshot handle and the caller-facing
//! `ShopService` (search, paging, browse, recommendations, chat, rebuild).

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod router;
pub mod service;
pub mod snapshot;

pub use router::{Dispatch, IntentRouter, Route};
pub use service::{ChatReply, PageItem, PageRequest, SearchPage, SearchParams, ShopService};
pub use snapshot::{build_snapshot, SnapshotHandle};
