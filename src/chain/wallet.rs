//! The wallet seam: whoever signs and broadcasts transactions.
//!
//! In a browser this is the wallet-adapter extension; in tests it is a stub;
//! [`KeypairWallet`] is a reference implementation that signs with a local
//! keypair and submits through an [`RpcClientLike`].

use async_trait::async_trait;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_keypair::Keypair;
use solana_signature::Signature;
use solana_signer::{Signer, SignerError};
use solana_transaction::versioned::VersionedTransaction;

use crate::chain::rpc::RpcClientLike;

/// Errors from signing or broadcasting a payment.
#[derive(thiserror::Error, Debug)]
pub enum SubmissionError {
    /// The signer refused or failed to produce a signature.
    #[error(transparent)]
    Signer(#[from] SignerError),
    /// The transaction was malformed or rejected before broadcast.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    /// RPC transport failure.
    #[error(transparent)]
    Transport(Box<ClientErrorKind>),
}

impl From<ClientError> for SubmissionError {
    fn from(value: ClientError) -> Self {
        SubmissionError::Transport(value.kind)
    }
}

/// An external signer that takes an unsigned transfer and returns the
/// signature of the submitted transaction.
///
/// The adapter owns signing and broadcast; confirmation stays with the
/// caller, which polls the RPC at its configured commitment level.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Signs `transaction` and submits it to the network.
    async fn send_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<Signature, SubmissionError>;
}

/// A [`WalletAdapter`] backed by a local [`Keypair`].
///
/// Useful for bots, CLIs, and integration tests, where no external wallet UI
/// exists. The keypair must be the fee payer of any transaction it is asked
/// to send.
pub struct KeypairWallet<R> {
    keypair: Keypair,
    rpc: R,
}

impl<R> KeypairWallet<R> {
    pub fn new(keypair: Keypair, rpc: R) -> Self {
        Self { keypair, rpc }
    }

    /// The address this wallet signs for.
    pub fn address(&self) -> crate::chain::Address {
        crate::chain::Address::from(self.keypair.pubkey())
    }

    fn sign(&self, mut tx: VersionedTransaction) -> Result<VersionedTransaction, SubmissionError> {
        let message_bytes = tx.message.serialize();
        let signature = self.keypair.try_sign_message(&message_bytes)?;
        let num_required = tx.message.header().num_required_signatures as usize;
        let static_keys = tx.message.static_account_keys();
        // Required signers are the leading static account keys.
        let position = static_keys[..num_required.min(static_keys.len())]
            .iter()
            .position(|key| *key == self.keypair.pubkey())
            .ok_or_else(|| {
                SubmissionError::InvalidTransaction(format!(
                    "{} is not a required signer",
                    self.keypair.pubkey()
                ))
            })?;
        if tx.signatures.len() < num_required {
            tx.signatures.resize(num_required, Signature::default());
        }
        tx.signatures[position] = signature;
        Ok(tx)
    }
}

#[async_trait]
impl<R> WalletAdapter for KeypairWallet<R>
where
    R: RpcClientLike + Send + Sync,
{
    async fn send_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<Signature, SubmissionError> {
        let signed = self.sign(transaction)?;
        tracing::debug!(signer = %self.keypair.pubkey(), "submitting signed transaction");
        let signature = self.rpc.send_transaction(&signed).await?;
        Ok(signature)
    }
}
