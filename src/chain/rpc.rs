//! The narrow RPC surface the payment flow needs.
//!
//! [`RpcClientLike`] covers exactly three calls: fetching a recent blockhash
//! (the freshness anchor embedded in every transaction), submitting a signed
//! transaction, and checking whether a signature has reached a commitment
//! level. A blanket implementation forwards to any container of the real
//! nonblocking [`RpcClient`], and tests substitute stubs.

use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_client::rpc_response::RpcResult;
use solana_commitment_config::CommitmentConfig;
use solana_message::Hash;
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;

pub trait RpcClientLike {
    /// Fetches the latest blockhash at the given commitment level.
    fn latest_blockhash(
        &self,
        commitment: CommitmentConfig,
    ) -> impl Future<Output = Result<Hash, ClientError>> + Send;

    /// Submits a signed transaction without waiting for confirmation.
    fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> impl Future<Output = Result<Signature, ClientError>> + Send;

    /// Checks whether `signature` has been confirmed at `commitment`.
    fn confirm_signature(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> impl Future<Output = RpcResult<bool>> + Send;
}

impl<Container: AsRef<RpcClient> + Sync> RpcClientLike for Container {
    fn latest_blockhash(
        &self,
        commitment: CommitmentConfig,
    ) -> impl Future<Output = Result<Hash, ClientError>> + Send {
        let client = self.as_ref();
        async move {
            let (blockhash, _last_valid_block_height) = client
                .get_latest_blockhash_with_commitment(commitment)
                .await?;
            Ok(blockhash)
        }
    }

    fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> impl Future<Output = Result<Signature, ClientError>> + Send {
        // Preflight simulation is skipped: the wallet already saw the
        // transaction, and confirmation reports failures either way.
        self.as_ref().send_transaction_with_config(
            transaction,
            RpcSendTransactionConfig {
                skip_preflight: true,
                ..RpcSendTransactionConfig::default()
            },
        )
    }

    fn confirm_signature(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> impl Future<Output = RpcResult<bool>> + Send {
        self.as_ref()
            .confirm_transaction_with_commitment(signature, commitment)
    }
}
