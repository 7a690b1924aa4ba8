//! Ingestion batch reports and checkpointing.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::indexer::RejectedRelation;

/// Outcome for one document in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Document id.
    pub doc_id: Ulid,

    /// Display name, for operators reading the report.
    pub document_name: String,

    /// Chunks embedded and upserted.
    pub chunks_indexed: usize,

    /// Relations written to the graph store.
    pub relations_accepted: usize,

    /// Relations refused by the integrity check.
    pub rejected_relations: Vec<RejectedRelation>,

    /// Failure message when this document could not be processed. Other
    /// documents in the batch are unaffected.
    pub error: Option<String>,
}

impl DocumentReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Run identifier.
    pub run_id: Ulid,

    /// Per-document outcomes, in input order.
    pub documents: Vec<DocumentReport>,

    /// Last document id of the unbroken success prefix, in input order. A
    /// crashed or partially failed batch resumes from here; nothing is
    /// rolled back.
    pub checkpoint: Option<Ulid>,
}

impl IngestReport {
    /// Compute the checkpoint from per-document outcomes.
    pub(crate) fn with_checkpoint(run_id: Ulid, documents: Vec<DocumentReport>) -> Self {
        let mut checkpoint = None;
        for report in &documents {
            if report.succeeded() {
                checkpoint = Some(report.doc_id);
            } else {
                break;
            }
        }
        Self {
            run_id,
            documents,
            checkpoint,
        }
    }

    /// How many documents failed.
    pub fn failed_documents(&self) -> usize {
        self.documents.iter().filter(|d| !d.succeeded()).count()
    }

    /// Total chunks indexed across the batch.
    pub fn total_chunks(&self) -> usize {
        self.documents.iter().map(|d| d.chunks_indexed).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(doc_id: Ulid, error: Option<&str>) -> DocumentReport {
        DocumentReport {
            doc_id,
            document_name: "doc".to_string(),
            chunks_indexed: 1,
            relations_accepted: 0,
            rejected_relations: Vec::new(),
            error: error.map(String::from),
        }
    }

    #[test]
    fn test_checkpoint_stops_at_first_failure() {
        let a = Ulid::new();
        let b = Ulid::new();
        let c = Ulid::new();
        let ingest = IngestReport::with_checkpoint(
            Ulid::new(),
            vec![report(a, None), report(b, Some("boom")), report(c, None)],
        );
        assert_eq!(ingest.checkpoint, Some(a));
        assert_eq!(ingest.failed_documents(), 1);
    }

    #[test]
    fn test_checkpoint_none_when_first_fails() {
        let ingest = IngestReport::with_checkpoint(
            Ulid::new(),
            vec![report(Ulid::new(), Some("boom"))],
        );
        assert_eq!(ingest.checkpoint, None);
    }

    #[test]
    fn test_checkpoint_last_when_all_succeed() {
        let a = Ulid::new();
        let b = Ulid::new();
        let ingest =
            IngestReport::with_checkpoint(Ulid::new(), vec![report(a, None), report(b, None)]);
        assert_eq!(ingest.checkpoint, Some(b));
    }
}
