//! Strategy selection and per-strategy parameters.
//!
//! Strategies form a closed set: each variant carries its own parameters, so
//! adding one is a compile-time change checked at every dispatch site, not a
//! string-keyed lookup.

use gridrag_core::{ChunkStrategy, ChunkingConfig, RagError, Result};

/// A chunking strategy with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategySpec {
    /// Fixed windows of N rows, no overlap.
    RowBased { rows_per_chunk: usize },

    /// Overlapping windows; stride = window - overlap.
    SlidingWindow { window: usize, overlap: usize },

    /// Sheet → Section → Leaf decomposition.
    Hierarchical {
        /// Column holding section labels; auto-detected when `None`.
        section_column: Option<String>,
        /// Rows per leaf chunk.
        leaf_rows: usize,
    },

    /// Column groups by semantic classification rules.
    ColumnSemantic { rows_per_chunk: usize },

    /// One chunk per entity key value.
    EntityCentric {
        /// Column holding the entity key; auto-detected when `None`.
        entity_column: Option<String>,
    },

    /// K-means over deterministic row feature vectors.
    TopicClustering {
        clusters: usize,
        max_iterations: usize,
    },

    /// Per-document shape heuristics pick one of the strategies above.
    AdaptiveSmart,
}

impl StrategySpec {
    /// The strategy tag this spec dispatches to.
    pub fn strategy(&self) -> ChunkStrategy {
        match self {
            Self::RowBased { .. } => ChunkStrategy::RowBased,
            Self::SlidingWindow { .. } => ChunkStrategy::SlidingWindow,
            Self::Hierarchical { .. } => ChunkStrategy::Hierarchical,
            Self::ColumnSemantic { .. } => ChunkStrategy::ColumnSemantic,
            Self::EntityCentric { .. } => ChunkStrategy::EntityCentric,
            Self::TopicClustering { .. } => ChunkStrategy::TopicClustering,
            Self::AdaptiveSmart => ChunkStrategy::AdaptiveSmart,
        }
    }

    /// Build the spec for a strategy tag, taking parameters from config
    /// defaults.
    pub fn from_config(strategy: ChunkStrategy, config: &ChunkingConfig) -> Self {
        match strategy {
            ChunkStrategy::RowBased => Self::RowBased {
                rows_per_chunk: config.rows_per_chunk,
            },
            ChunkStrategy::SlidingWindow => Self::SlidingWindow {
                window: config.window,
                overlap: config.overlap,
            },
            ChunkStrategy::Hierarchical => Self::Hierarchical {
                section_column: None,
                leaf_rows: config.leaf_rows,
            },
            ChunkStrategy::ColumnSemantic => Self::ColumnSemantic {
                rows_per_chunk: config.rows_per_chunk,
            },
            ChunkStrategy::EntityCentric => Self::EntityCentric {
                entity_column: None,
            },
            ChunkStrategy::TopicClustering => Self::TopicClustering {
                clusters: config.clusters,
                max_iterations: config.max_iterations,
            },
            ChunkStrategy::AdaptiveSmart => Self::AdaptiveSmart,
        }
    }

    /// Reject out-of-range parameters before any chunk is produced.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::RowBased { rows_per_chunk } | Self::ColumnSemantic { rows_per_chunk } => {
                if *rows_per_chunk == 0 {
                    return Err(RagError::configuration("rows_per_chunk must be positive"));
                }
            }
            Self::SlidingWindow { window, overlap } => {
                if *window == 0 {
                    return Err(RagError::configuration("window must be positive"));
                }
                if overlap >= window {
                    return Err(RagError::configuration(format!(
                        "overlap ({}) must be smaller than window ({})",
                        overlap, window
                    )));
                }
            }
            Self::Hierarchical { leaf_rows, .. } => {
                if *leaf_rows == 0 {
                    return Err(RagError::configuration("leaf_rows must be positive"));
                }
            }
            Self::TopicClustering {
                clusters,
                max_iterations,
            } => {
                if *clusters == 0 {
                    return Err(RagError::configuration("clusters must be positive"));
                }
                if *max_iterations == 0 {
                    return Err(RagError::configuration("max_iterations must be positive"));
                }
            }
            Self::EntityCentric { .. } | Self::AdaptiveSmart => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_uses_defaults() {
        let config = ChunkingConfig::default();
        let spec = StrategySpec::from_config(ChunkStrategy::SlidingWindow, &config);
        assert_eq!(
            spec,
            StrategySpec::SlidingWindow {
                window: 6,
                overlap: 2
            }
        );
    }

    #[test]
    fn test_overlap_ge_window_rejected() {
        let spec = StrategySpec::SlidingWindow {
            window: 4,
            overlap: 4,
        };
        assert!(matches!(
            spec.validate(),
            Err(RagError::Configuration { .. })
        ));
    }

    #[test]
    fn test_zero_window_rejected() {
        let spec = StrategySpec::SlidingWindow {
            window: 0,
            overlap: 0,
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_zero_clusters_rejected() {
        let spec = StrategySpec::TopicClustering {
            clusters: 0,
            max_iterations: 8,
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_valid_specs_pass() {
        let config = ChunkingConfig::default();
        for strategy in [
            ChunkStrategy::RowBased,
            ChunkStrategy::SlidingWindow,
            ChunkStrategy::Hierarchical,
            ChunkStrategy::ColumnSemantic,
            ChunkStrategy::EntityCentric,
            ChunkStrategy::TopicClustering,
            ChunkStrategy::AdaptiveSmart,
        ] {
            assert!(StrategySpec::from_config(strategy, &config).validate().is_ok());
        }
    }
}
