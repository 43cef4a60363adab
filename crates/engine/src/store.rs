//! In-memory engine store.
//!
//! Concurrent maps keyed by typed IDs. Workflow instances sit behind a
//! per-instance mutex so concurrent decisions serialize on one lock.
//! Posting records are keyed by (document, ledger); map-key uniqueness
//! makes re-posting a successful pair a no-op, while failed pairs stay
//! replaceable so a remediation retry can land a new outcome.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use paraledger_shared::types::{DocumentId, LedgerId, WorkflowInstanceId};

use paraledger_core::audit::{AuditLog, AuditRecord};
use paraledger_core::document::Document;
use paraledger_core::posting::{DerivedDocument, ParallelPosting};
use paraledger_core::workflow::WorkflowInstance;

/// The engine's concurrent in-memory state.
#[derive(Debug, Default)]
pub struct EngineStore {
    documents: DashMap<DocumentId, Document>,
    instances: DashMap<WorkflowInstanceId, Arc<Mutex<WorkflowInstance>>>,
    instance_by_document: DashMap<DocumentId, WorkflowInstanceId>,
    postings: DashMap<(DocumentId, LedgerId), ParallelPosting>,
    derived: DashMap<(DocumentId, LedgerId), DerivedDocument>,
    audit: Mutex<AuditLog>,
}

impl EngineStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a document.
    pub fn put_document(&self, document: Document) {
        self.documents.insert(document.id, document);
    }

    /// Returns a copy of a document.
    #[must_use]
    pub fn document(&self, id: DocumentId) -> Option<Document> {
        self.documents.get(&id).map(|d| d.clone())
    }

    /// Mutates a document in place; returns false when absent.
    pub fn with_document_mut(&self, id: DocumentId, f: impl FnOnce(&mut Document)) -> bool {
        match self.documents.get_mut(&id) {
            Some(mut doc) => {
                f(&mut doc);
                true
            }
            None => false,
        }
    }

    /// Registers a workflow instance and indexes it by document.
    pub fn put_instance(&self, instance: WorkflowInstance) -> Arc<Mutex<WorkflowInstance>> {
        let id = instance.id;
        let document_id = instance.document_id;
        let arc = Arc::new(Mutex::new(instance));
        self.instances.insert(id, Arc::clone(&arc));
        self.instance_by_document.insert(document_id, id);
        arc
    }

    /// Looks up an instance by id.
    #[must_use]
    pub fn instance(&self, id: WorkflowInstanceId) -> Option<Arc<Mutex<WorkflowInstance>>> {
        self.instances.get(&id).map(|e| Arc::clone(&e))
    }

    /// Looks up the instance created for a document.
    #[must_use]
    pub fn instance_for_document(
        &self,
        document: DocumentId,
    ) -> Option<Arc<Mutex<WorkflowInstance>>> {
        let id = *self.instance_by_document.get(&document)?;
        self.instance(id)
    }

    /// Snapshots all instances, in no particular order.
    #[must_use]
    pub fn all_instances(&self) -> Vec<Arc<Mutex<WorkflowInstance>>> {
        self.instances.iter().map(|e| Arc::clone(&e)).collect()
    }

    /// Records a posting attempt.
    ///
    /// Returns the stored record and whether this call inserted it. A
    /// successful outcome is permanent: later attempts for the same
    /// (document, ledger) pair return it untouched. A failed outcome is
    /// replaced by the next attempt so retries can record remediation.
    pub fn record_posting(&self, posting: ParallelPosting) -> (ParallelPosting, bool) {
        match self.postings.entry((posting.document, posting.ledger)) {
            Entry::Occupied(mut existing) => {
                if existing.get().outcome.is_success() {
                    (existing.get().clone(), false)
                } else {
                    let stored = posting.clone();
                    existing.insert(posting);
                    (stored, true)
                }
            }
            Entry::Vacant(slot) => {
                let stored = posting.clone();
                slot.insert(posting);
                (stored, true)
            }
        }
    }

    /// Stores a derived document alongside its posting record.
    pub fn put_derived(&self, derived: DerivedDocument) {
        self.derived
            .insert((derived.source, derived.ledger), derived);
    }

    /// Returns a copy of the derived document for one ledger.
    #[must_use]
    pub fn derived(&self, document: DocumentId, ledger: LedgerId) -> Option<DerivedDocument> {
        self.derived.get(&(document, ledger)).map(|d| d.clone())
    }

    /// Returns a copy of one posting record.
    #[must_use]
    pub fn posting(&self, document: DocumentId, ledger: LedgerId) -> Option<ParallelPosting> {
        self.postings.get(&(document, ledger)).map(|p| p.clone())
    }

    /// All posting records for a document, in no particular order.
    #[must_use]
    pub fn postings_for_document(&self, document: DocumentId) -> Vec<ParallelPosting> {
        self.postings
            .iter()
            .filter(|e| e.key().0 == document)
            .map(|e| e.value().clone())
            .collect()
    }

    /// Appends an audit record.
    ///
    /// # Panics
    ///
    /// Panics if the audit lock is poisoned, which only happens after a
    /// panic while appending.
    pub fn record_audit(&self, record: AuditRecord) {
        self.audit
            .lock()
            .expect("audit log lock poisoned")
            .record(record);
    }

    /// Copies the audit trail for a document, in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the audit lock is poisoned.
    #[must_use]
    pub fn audit_trail(&self, document: DocumentId) -> Vec<AuditRecord> {
        self.audit
            .lock()
            .expect("audit log lock poisoned")
            .for_document(document)
            .into_iter()
            .cloned()
            .collect()
    }
}
