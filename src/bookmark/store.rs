use std::sync::{Mutex, MutexGuard};

use crate::models::{apply_all, AttributeOp, AttributeRecord};

/// Persistence seam for one block instance's attributes.
///
/// The host document owns the record; the core only reads it and submits
/// batches of updates. A batch passed to `set` is applied atomically.
pub trait AttributeStore: Send + Sync {
    fn get(&self) -> AttributeRecord;
    fn set(&self, ops: Vec<AttributeOp>);
}

/// In-process store, one per block instance.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<AttributeRecord>,
}

impl MemoryStore {
    pub fn new(record: AttributeRecord) -> Self {
        MemoryStore {
            record: Mutex::new(record),
        }
    }

    pub fn into_inner(self) -> AttributeRecord {
        self.record
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> MutexGuard<'_, AttributeRecord> {
        // Ops are pure, so a panic elsewhere cannot leave a half-applied batch.
        self.record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AttributeStore for MemoryStore {
    fn get(&self) -> AttributeRecord {
        self.lock().clone()
    }

    fn set(&self, ops: Vec<AttributeOp>) {
        let mut guard = self.lock();
        let current = std::mem::take(&mut *guard);
        *guard = apply_all(current, ops);
    }
}
