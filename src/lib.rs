//! Client-side Solana payment flows.
//!
//! `payflow` is the glue between a host UI and the Solana network for one
//! job: send a native SOL payment and record the result in a locally
//! persisted transaction history. It owns no protocol and runs no server;
//! signing, broadcast, and storage all sit behind traits supplied by the
//! host.
//!
//! # Flow
//!
//! 1. The host feeds wallet connection events into a [`session::WalletSession`],
//!    which derives the display avatar for the connected address.
//! 2. The user fills a [`session::ComposerForm`] (amount, receiver, purpose).
//! 3. [`submit::PaymentSubmitter::submit_payment`] validates the form, builds
//!    a transfer anchored to a fresh blockhash with an unpredictable
//!    reference tag, delegates signing and broadcast to the
//!    [`chain::WalletAdapter`], awaits confirmation, and appends a receipt to
//!    the [`ledger::TransactionLedger`] - `Completed` or `Failed` to match
//!    the real outcome.
//!
//! # Modules
//!
//! - [`amount`] - exact decimal-to-lamport conversion, never floating point
//! - [`avatar`] - deterministic avatar URL derivation
//! - [`chain`] - addresses plus the RPC and wallet seams
//! - [`config`] - environment-driven settings with devnet defaults
//! - [`ledger`] - receipts, pluggable stores, persisted history
//! - [`session`] - wallet session and composer state
//! - [`submit`] - the payment flow itself
//! - [`telemetry`] - `tracing` subscriber setup for hosts
//! - [`timestamp`] - stringified Unix timestamps for receipts
//!
//! # Example
//!
//! ```ignore
//! use payflow::chain::KeypairWallet;
//! use payflow::config::PayflowConfig;
//! use payflow::ledger::{JsonFileStore, TransactionLedger};
//! use payflow::submit::PaymentSubmitter;
//! use solana_client::nonblocking::rpc_client::RpcClient;
//! use std::sync::Arc;
//!
//! let config = PayflowConfig::from_env()?;
//! let rpc = Arc::new(RpcClient::new(config.rpc_url.to_string()));
//! let wallet = KeypairWallet::new(keypair, Arc::clone(&rpc));
//! let store = JsonFileStore::new("~/.payflow")?;
//! let ledger = TransactionLedger::load(store, config.ledger_key.clone())?;
//! let avatars = payflow::avatar::DiceBearAvatars::default();
//! let mut submitter = PaymentSubmitter::new(&config, wallet, rpc, avatars, ledger);
//! ```

pub mod amount;
pub mod avatar;
pub mod chain;
pub mod config;
pub mod ledger;
pub mod session;
pub mod submit;
pub mod telemetry;
pub mod timestamp;

pub use amount::{AmountError, SolAmount};
pub use avatar::{AvatarSource, DiceBearAvatars};
pub use chain::{Address, AddressParseError, KeypairWallet, RpcClientLike, SubmissionError, WalletAdapter};
pub use config::{ConfigError, PayflowConfig};
pub use ledger::{
    JsonFileStore, MemoryStore, Party, ReceiptDraft, ReceiptStore, StoreError, TransactionLedger,
    TransactionReceipt, TransactionStatus,
};
pub use session::{ComposerForm, ComposerState, WalletSession};
pub use submit::{PaymentError, PaymentSubmitter, TransferRequest, build_transfer_request};
pub use timestamp::UnixTimestamp;
