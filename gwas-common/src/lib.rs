//! # GWAS Common Library
//!
//! Shared code for the GWAS trait extraction viewer:
//! - Trait field table and read-only record types
//! - Completeness scoring and citation source tally
//! - Accuracy reconciliation and display helpers
//! - Configuration loading
//! - Common error type

pub mod accuracy;
pub mod citations;
pub mod completeness;
pub mod config;
pub mod display;
pub mod error;
pub mod fields;
pub mod models;

pub use completeness::{classify, score, Completeness, FieldLookup, FieldStatus};
pub use citations::{tally, tally_sources, SourceCount};
pub use error::{Error, Result};
pub use fields::{TraitField, TRAIT_FIELDS};
pub use models::{DocumentSummary, ImagePageRef, PageRecord, SearchHit, TextPageStat, TraitRecord};
