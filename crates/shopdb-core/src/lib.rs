//! shopdb-core
//!
//! Catalog data model, configuration, error taxonomy, record normalization,
//! corpus construction and price handling shared by the other crates.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod browse;
pub mod catalog;
pub mod config;
pub mod corpus;
pub mod error;
pub mod price;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
