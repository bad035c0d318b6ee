//! Shared test doubles: a scriptable ledger and an in-memory store.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use solana_event_indexer::{
    EventEnvelope, EventRecord, EventStore, EventType, IndexerError, LedgerRpc,
    LedgerTransaction, PutOutcome, Result, SignatureRecord,
};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scriptable [`LedgerRpc`]: per-program page queues and a
/// signature → transaction map.
#[derive(Default)]
pub struct MockLedgerRpc {
    pages: Mutex<HashMap<Pubkey, VecDeque<Vec<SignatureRecord>>>>,
    transactions: Mutex<HashMap<Signature, LedgerTransaction>>,
    failing_fetches: Mutex<HashSet<Signature>>,
    pub page_requests: AtomicUsize,
    pub last_until: Mutex<Option<Signature>>,
}

impl MockLedgerRpc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page_for(&self, program: Pubkey, page: Vec<SignatureRecord>) {
        self.pages
            .lock()
            .unwrap()
            .entry(program)
            .or_default()
            .push_back(page);
    }

    pub fn insert_transaction(&self, signature: Signature, tx: LedgerTransaction) {
        self.transactions.lock().unwrap().insert(signature, tx);
    }

    /// Makes fetching `signature` fail with a transport error.
    pub fn fail_fetch(&self, signature: Signature) {
        self.failing_fetches.lock().unwrap().insert(signature);
    }

    pub fn clear_failures(&self) {
        self.failing_fetches.lock().unwrap().clear();
    }
}

#[async_trait]
impl LedgerRpc for MockLedgerRpc {
    async fn signatures_for(
        &self,
        program: &Pubkey,
        _limit: usize,
        _before: Option<Signature>,
        until: Option<Signature>,
    ) -> Result<Vec<SignatureRecord>> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        *self.last_until.lock().unwrap() = until;
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get_mut(program)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default())
    }

    async fn transaction(&self, signature: &Signature) -> Result<Option<LedgerTransaction>> {
        if self.failing_fetches.lock().unwrap().contains(signature) {
            return Err(IndexerError::RpcError("connection reset".to_string()));
        }
        Ok(self.transactions.lock().unwrap().get(signature).cloned())
    }
}

/// In-memory [`EventStore`] enforcing the `(signature, event_type, ordinal)`
/// uniqueness invariant.
#[derive(Default)]
pub struct MemoryEventStore {
    records: Mutex<Vec<EventRecord>>,
    keys: Mutex<HashSet<(String, String, u32)>>,
    fail_puts: AtomicBool,
    close_calls: AtomicUsize,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn distinct_keys(&self) -> usize {
        self.keys.lock().unwrap().len()
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    fn envelope(record: &EventRecord) -> EventEnvelope {
        EventEnvelope {
            event_type: record.event_type,
            signature: record.signature.clone(),
            slot: record.slot,
            ordinal: record.ordinal,
            block_time: record.block_time,
            program_id: record.program_id.to_string(),
            ingested_at: record.ingested_at,
        }
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn ensure_indexes(&self) -> Result<()> {
        Ok(())
    }

    async fn put(&self, record: &EventRecord) -> Result<PutOutcome> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(IndexerError::StorageUnsupported(
                "simulated store failure".to_string(),
            ));
        }
        let key = (
            record.signature.clone(),
            record.event_type.as_str().to_string(),
            record.ordinal,
        );
        if !self.keys.lock().unwrap().insert(key) {
            return Ok(PutOutcome::Duplicate);
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(PutOutcome::Inserted)
    }

    async fn events_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<EventEnvelope>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.block_time >= from && r.block_time <= to)
            .map(Self::envelope)
            .collect())
    }

    async fn events_by_type(
        &self,
        event_type: EventType,
        limit: i64,
    ) -> Result<Vec<EventEnvelope>> {
        let mut envelopes: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.event_type == event_type)
            .map(Self::envelope)
            .collect();
        envelopes.sort_by(|a, b| b.block_time.cmp(&a.block_time));
        envelopes.truncate(limit.max(0) as usize);
        Ok(envelopes)
    }

    async fn events_by_signature(&self, signature: &str) -> Result<Vec<EventEnvelope>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.signature == signature)
            .map(Self::envelope)
            .collect())
    }

    async fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A transaction whose log sequence is `logs` and whose account keys are
/// `accounts`.
pub fn ledger_tx(slot: u64, logs: Vec<String>, accounts: Vec<Pubkey>) -> LedgerTransaction {
    LedgerTransaction {
        slot,
        block_time: Some(1_700_000_000 + slot as i64),
        log_messages: logs,
        account_keys: accounts,
        failed: false,
    }
}

pub fn signature_record(signature: Signature, slot: u64) -> SignatureRecord {
    SignatureRecord {
        signature,
        slot,
        block_time: Some(1_700_000_000 + slot as i64),
    }
}
