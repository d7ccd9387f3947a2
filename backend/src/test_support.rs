//! Shared test doubles for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{OperationLog, OperationLogError};
use crate::domain::{OperationId, OperationRecord};

/// Clock frozen at a settable instant.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Clock at 2024-04-01 08:00:00 UTC.
    pub fn fixture() -> Arc<Self> {
        let now = Utc
            .with_ymd_and_hms(2024, 4, 1, 8, 0, 0)
            .single()
            .expect("valid fixture timestamp");
        Arc::new(Self::new(now))
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.lock() += delta;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().expect("clock mutex")
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

/// Operation log held in memory.
#[derive(Default)]
pub struct MemoryOperationLog(Mutex<Vec<OperationRecord>>);

impl MemoryOperationLog {
    pub fn entries(&self) -> Vec<OperationRecord> {
        self.0.lock().expect("log mutex").clone()
    }
}

#[async_trait]
impl OperationLog for MemoryOperationLog {
    async fn find(
        &self,
        op_id: &OperationId,
    ) -> Result<Option<OperationRecord>, OperationLogError> {
        Ok(self
            .0
            .lock()
            .expect("log mutex")
            .iter()
            .find(|entry| &entry.op_id == op_id)
            .cloned())
    }

    async fn record(&self, entry: OperationRecord) -> Result<(), OperationLogError> {
        self.0.lock().expect("log mutex").push(entry);
        Ok(())
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, OperationLogError> {
        let mut entries = self.0.lock().expect("log mutex");
        let before = entries.len();
        entries.retain(|entry| !entry.is_older_than(cutoff));
        Ok(before - entries.len())
    }
}
