//! gridrag-core - Core types and traits for the hybrid retrieval engine
//!
//! This crate provides the foundational types, traits, configuration, and
//! error handling used throughout the gridrag workspace.

pub mod config;
pub mod error;
pub mod slug;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{RagError, Result};
pub use slug::collection_slug;
pub use traits::*;
pub use types::*;
