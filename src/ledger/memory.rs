use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::warn;
use uuid::Uuid;

use super::{
    CostLedger, CostLedgerEntry, EntryId, LedgerError, TerminalStatus, TokenUsage, UsageStage,
};

/// In-memory ledger for embedded deployments and tests.
#[derive(Default)]
pub struct InMemoryLedger {
    entries: Mutex<HashMap<EntryId, CostLedgerEntry>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one entry.
    pub fn entry(&self, id: &EntryId) -> Option<CostLedgerEntry> {
        self.entries.lock().get(id).cloned()
    }

    /// Snapshot of every entry, oldest first.
    pub fn entries(&self) -> Vec<CostLedgerEntry> {
        let mut entries: Vec<_> = self.entries.lock().values().cloned().collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        entries
    }

    /// Snapshot of every entry belonging to `run_id`.
    pub fn entries_for_run(&self, run_id: Uuid) -> Vec<CostLedgerEntry> {
        let mut entries: Vec<_> = self
            .entries
            .lock()
            .values()
            .filter(|e| e.run_id == run_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        entries
    }

    /// Number of entries with the given terminal state in `run_id`.
    pub fn count_with_status(&self, run_id: Uuid, status: TerminalStatus) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|e| e.run_id == run_id && e.status == Some(status))
            .count()
    }
}

#[async_trait]
impl CostLedger for InMemoryLedger {
    async fn create(
        &self,
        subject: &str,
        analysis_id: &str,
        run_id: Uuid,
    ) -> Result<EntryId, LedgerError> {
        let id = EntryId(Uuid::new_v4());
        let entry = CostLedgerEntry {
            id: id.clone(),
            subject: subject.to_string(),
            analysis_id: analysis_id.to_string(),
            run_id,
            usage: Vec::new(),
            status: None,
            created_at: Utc::now(),
            finished_at: None,
        };

        self.entries.lock().insert(id.clone(), entry);
        Ok(id)
    }

    async fn record_usage(
        &self,
        entry: &EntryId,
        stage: UsageStage,
        usage: TokenUsage,
    ) -> Result<(), LedgerError> {
        let mut entries = self.entries.lock();
        let record = entries
            .get_mut(entry)
            .ok_or_else(|| LedgerError::UnknownEntry { id: entry.clone() })?;

        if let Some((_, existing)) = record.usage.iter_mut().find(|(s, _)| *s == stage) {
            existing.add(usage);
        } else {
            record.usage.push((stage, usage));
        }

        Ok(())
    }

    async fn complete(&self, entry: &EntryId, status: TerminalStatus) -> Result<(), LedgerError> {
        let mut entries = self.entries.lock();
        let record = entries
            .get_mut(entry)
            .ok_or_else(|| LedgerError::UnknownEntry { id: entry.clone() })?;

        if let Some(existing) = record.status {
            warn!(
                entry = %entry,
                existing = ?existing,
                attempted = ?status,
                "ledger entry already terminal, keeping first state"
            );
            return Ok(());
        }

        record.status = Some(status);
        record.finished_at = Some(Utc::now());
        Ok(())
    }
}
