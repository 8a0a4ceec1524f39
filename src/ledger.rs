//! Locally persisted transaction history.
//!
//! Every submission attempt produces a [`TransactionReceipt`], prepended to a
//! [`TransactionLedger`] so the newest entry comes first. The ledger writes
//! through to a [`ReceiptStore`] on every mutation and reloads from it on
//! construction, so history survives process restarts with any store that
//! actually persists.
//!
//! Stores are key-value with JSON values, mirroring the `localStorage` shape
//! a web host provides. [`MemoryStore`] backs tests; [`JsonFileStore`] keeps
//! one JSON document per key on disk.

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::chain::Address;
use crate::timestamp::UnixTimestamp;

/// Storage key under which the ledger persists by default.
pub const DEFAULT_LEDGER_KEY: &str = "transactions";

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// A key-value store holding JSON documents.
pub trait ReceiptStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;
    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;
}

impl<S: ReceiptStore> ReceiptStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// In-memory [`ReceiptStore`]. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, serde_json::Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReceiptStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// [`ReceiptStore`] persisting each key as `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Creates the store, making sure `root` exists.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl ReceiptStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let path = self.path_for(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&value)?;
        std::fs::write(self.path_for(key), bytes)?;
        Ok(())
    }
}

/// Outcome of a submission attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Completed,
    Failed,
}

/// One side of a transfer as it appears in history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub address: Address,
    pub avatar: String,
    pub verified: bool,
}

/// A single entry in the transaction history.
///
/// `id` is assigned by the ledger: unique, contiguous, and increasing with
/// insertion order. `identifier` carries the transaction signature for
/// completed payments and `"-"` otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub id: String,
    pub sender: Party,
    pub receiver: Party,
    pub description: String,
    pub timestamp: UnixTimestamp,
    pub status: TransactionStatus,
    pub amount: Decimal,
    pub source: String,
    pub identifier: String,
}

/// A receipt before the ledger assigns its id.
#[derive(Clone, Debug)]
pub struct ReceiptDraft {
    pub sender: Party,
    pub receiver: Party,
    pub description: String,
    pub timestamp: UnixTimestamp,
    pub status: TransactionStatus,
    pub amount: Decimal,
    pub source: String,
    pub identifier: String,
}

impl ReceiptDraft {
    fn into_receipt(self, id: String) -> TransactionReceipt {
        TransactionReceipt {
            id,
            sender: self.sender,
            receiver: self.receiver,
            description: self.description,
            timestamp: self.timestamp,
            status: self.status,
            amount: self.amount,
            source: self.source,
            identifier: self.identifier,
        }
    }
}

/// Ordered transaction history, newest first, written through to a store.
///
/// Single-writer: the ledger takes `&mut self` for every mutation and no
/// internal synchronization is attempted beyond what the store provides.
#[derive(Debug)]
pub struct TransactionLedger<S> {
    store: S,
    key: String,
    receipts: Vec<TransactionReceipt>,
}

impl<S: ReceiptStore> TransactionLedger<S> {
    /// Loads existing history from `store` under `key`, or starts empty.
    pub fn load(store: S, key: impl Into<String>) -> Result<Self, StoreError> {
        let key = key.into();
        let receipts = match store.get(&key)? {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };
        Ok(Self {
            store,
            key,
            receipts,
        })
    }

    /// Receipts, newest first.
    pub fn receipts(&self) -> &[TransactionReceipt] {
        &self.receipts
    }

    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    // Receipts are only ever removed all at once, so the count doubles as
    // the id sequence.
    fn next_id(&self) -> String {
        (self.receipts.len() + 1).to_string()
    }

    /// Assigns the next id, prepends the receipt, and persists.
    ///
    /// If the store rejects the write, the insert is rolled back so the
    /// in-memory history never drifts ahead of what the store holds; the
    /// same id is reused by the next attempt.
    pub fn record(&mut self, draft: ReceiptDraft) -> Result<&TransactionReceipt, StoreError> {
        let receipt = draft.into_receipt(self.next_id());
        self.receipts.insert(0, receipt);
        if let Err(error) = self.persist() {
            self.receipts.remove(0);
            return Err(error);
        }
        Ok(&self.receipts[0])
    }

    /// Drops the whole history and persists the empty state.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.receipts.clear();
        self.persist()
    }

    fn persist(&self) -> Result<(), StoreError> {
        let value = serde_json::to_value(&self.receipts)?;
        self.store.set(&self.key, value)
    }
}
