//! Nested transactions over an object store
//!
//! Only the outermost start opens a store transaction and only the matching
//! outermost end commits it. One manager belongs to one request; it is not
//! meant to be shared between threads.

use std::sync::Arc;

use crate::error::{NakedError, NakedResult};
use crate::lifecycle::{ObjectStore, PersistenceContext};

/// Nesting counter around the store's transaction
pub struct TransactionManager {
    store: Arc<dyn ObjectStore>,
    level: usize,
    user_aborted: bool,
    unit_of_work: Option<PersistenceContext>,
}

impl TransactionManager {
    /// Manager over a store
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            level: 0,
            user_aborted: false,
            unit_of_work: None,
        }
    }

    /// Current nesting depth
    pub fn transaction_level(&self) -> usize {
        self.level
    }

    /// Whether a transaction is open
    pub fn in_transaction(&self) -> bool {
        self.unit_of_work.is_some()
    }

    /// Enter a (possibly nested) transaction
    pub fn start_transaction(&mut self) {
        if self.unit_of_work.is_none() {
            self.unit_of_work = Some(PersistenceContext::new());
            self.level = 0;
            self.user_aborted = false;
            self.store.start_transaction();
            log::trace!("transaction started");
        }
        self.level += 1;
    }

    /// Leave a transaction; the outermost end commits
    pub fn end_transaction(&mut self) -> NakedResult<()> {
        if self.level == 0 {
            if self.user_aborted {
                log::debug!("ending a transaction the user aborted");
                return Ok(());
            }
            return Err(NakedError::Transaction("No transaction running to end".into()));
        }
        self.level -= 1;
        if self.level == 0 {
            self.unit_of_work = None;
            self.store.end_transaction()?;
            log::trace!("transaction committed");
        }
        Ok(())
    }

    /// Abandon the whole transaction, whatever the depth
    pub fn abort_transaction(&mut self) {
        if self.unit_of_work.take().is_some() {
            self.level = 0;
            self.store.abort_transaction();
            log::debug!("transaction aborted");
        }
    }

    /// Abort at the user's request; a later unmatched end is tolerated
    pub fn user_abort_transaction(&mut self) {
        self.abort_transaction();
        self.user_aborted = true;
    }

    /// State of the open unit of work
    pub fn unit_of_work(&mut self) -> NakedResult<&mut PersistenceContext> {
        self.unit_of_work
            .as_mut()
            .ok_or_else(|| NakedError::Transaction("no unit of work outside a transaction".into()))
    }

    /// Read-only view of the open unit of work
    pub fn current_unit_of_work(&self) -> Option<&PersistenceContext> {
        self.unit_of_work.as_ref()
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("level", &self.level)
            .field("user_aborted", &self.user_aborted)
            .finish()
    }
}
