//! gridrag-query - Hybrid search planning and score fusion
//!
//! Runs vector similarity and graph expansion sub-queries concurrently under
//! one deadline, unions their candidates, fuses per-source scores into one
//! ranking, and attaches chunk payloads. One unavailable source degrades the
//! response instead of failing it.

mod assemble;
mod fusion;
mod planner;

pub use fusion::{fuse, merge_candidates, Candidate};
pub use planner::{QueryPlanner, SearchOptions};

// Re-export types for convenience
pub use gridrag_core::{FusedCandidate, FusionWeights, SearchHit, SearchResponse};
