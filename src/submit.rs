//! The payment submission flow.
//!
//! [`PaymentSubmitter`] ties the seams together: it validates the composer
//! form against the session, builds a native SOL transfer anchored to a fresh
//! blockhash, hands it to the [`WalletAdapter`] for signing and broadcast,
//! awaits confirmation at the configured commitment level, and records a
//! [`TransactionReceipt`] whose status reflects the actual outcome.
//!
//! Validation failures (`NotConnected`, `InvalidAddress`, `InvalidAmount`)
//! return early and leave both the ledger and the composer untouched.
//! Failures after validation - signing refused, transport down, transaction
//! rejected - are logged, recorded as a `Failed` receipt, and still close the
//! composer, so history reflects every attempt.

use solana_commitment_config::CommitmentConfig;
use solana_instruction::AccountMeta;
use solana_message::v0::Message as MessageV0;
use solana_message::{Hash, VersionedMessage};
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_system_interface::instruction as system_instruction;
use solana_transaction::versioned::VersionedTransaction;
use std::time::Duration;

use crate::amount::{AmountError, SolAmount};
use crate::avatar::AvatarSource;
use crate::chain::rpc::RpcClientLike;
use crate::chain::wallet::{SubmissionError, WalletAdapter};
use crate::chain::{Address, AddressParseError};
use crate::config::PayflowConfig;
use crate::ledger::{
    Party, ReceiptDraft, ReceiptStore, StoreError, TransactionLedger, TransactionReceipt,
    TransactionStatus,
};
use crate::session::{ComposerForm, WalletSession};
use crate::timestamp::UnixTimestamp;

/// Errors surfaced by [`PaymentSubmitter::submit_payment`].
///
/// Submission failures after validation do not appear here; they are folded
/// into the recorded receipt as [`TransactionStatus::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// No wallet session is active.
    #[error("wallet is not connected")]
    NotConnected,
    /// The receiver field is not a valid address.
    #[error("invalid receiver address: {0}")]
    InvalidAddress(#[from] AddressParseError),
    /// The amount field is not a transferable amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
    /// Signing or broadcast failed before an attempt could be recorded.
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    /// The receipt could not be persisted.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// An unsigned transfer, ready for the wallet adapter.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Unsigned v0 transaction with the sender as fee payer.
    pub transaction: VersionedTransaction,
    /// Correlation tag carried as an extra read-only account.
    pub reference: Pubkey,
    /// Transfer value in lamports.
    pub lamports: u64,
}

/// Assembles the transfer message around an already-fetched blockhash.
///
/// The message holds a single system-program transfer from `from` to `to`,
/// with `from` as fee payer and `reference` appended to the instruction as a
/// non-signer read-only account so off-chain systems can locate the
/// transaction later.
pub fn transfer_request(
    from: &Address,
    to: &Address,
    lamports: u64,
    reference: Pubkey,
    recent_blockhash: Hash,
) -> Result<TransferRequest, SubmissionError> {
    let mut transfer = system_instruction::transfer(from.pubkey(), to.pubkey(), lamports);
    transfer
        .accounts
        .push(AccountMeta::new_readonly(reference, false));
    let message = MessageV0::try_compile(from.pubkey(), &[transfer], &[], recent_blockhash)
        .map_err(|e| SubmissionError::InvalidTransaction(format!("{e:?}")))?;
    Ok(TransferRequest {
        transaction: VersionedTransaction {
            signatures: vec![],
            message: VersionedMessage::V0(message),
        },
        reference,
        lamports,
    })
}

/// Builds a transfer request against a fresh blockhash.
///
/// Converts `amount` to lamports with exact arithmetic, fetches the freshness
/// anchor from `rpc` at `freshness`, and assembles the unsigned transaction.
pub async fn build_transfer_request<R: RpcClientLike>(
    rpc: &R,
    from: &Address,
    to: &Address,
    amount: &SolAmount,
    reference: Pubkey,
    freshness: CommitmentConfig,
) -> Result<TransferRequest, PaymentError> {
    let lamports = amount.to_lamports()?;
    let recent_blockhash = rpc
        .latest_blockhash(freshness)
        .await
        .map_err(SubmissionError::from)?;
    let request = transfer_request(from, to, lamports, reference, recent_blockhash)?;
    Ok(request)
}

fn random_reference() -> Pubkey {
    let seed: [u8; 32] = rand::random();
    Pubkey::new_from_array(seed)
}

/// Drives payments end to end and records every attempt in the ledger.
pub struct PaymentSubmitter<W, R, S, A> {
    wallet: W,
    rpc: R,
    avatars: A,
    ledger: TransactionLedger<S>,
    freshness: CommitmentConfig,
    confirmation: CommitmentConfig,
    network_label: String,
}

impl<W, R, S, A> PaymentSubmitter<W, R, S, A>
where
    W: WalletAdapter,
    R: RpcClientLike,
    S: ReceiptStore,
    A: AvatarSource,
{
    pub fn new(
        config: &PayflowConfig,
        wallet: W,
        rpc: R,
        avatars: A,
        ledger: TransactionLedger<S>,
    ) -> Self {
        Self {
            wallet,
            rpc,
            avatars,
            ledger,
            freshness: config.freshness_commitment,
            confirmation: config.confirmation_commitment,
            network_label: config.network_label.clone(),
        }
    }

    /// The transaction history this submitter writes to.
    pub fn ledger(&self) -> &TransactionLedger<S> {
        &self.ledger
    }

    /// Submits the payment described by `form` on behalf of `session`.
    ///
    /// On a recordable attempt - whether the network accepted it or not -
    /// the receipt is appended to the ledger, the composer closes, and the
    /// form resets. See the module docs for the validation/attempt split.
    pub async fn submit_payment(
        &mut self,
        session: &WalletSession,
        form: &mut ComposerForm,
    ) -> Result<TransactionReceipt, PaymentError> {
        if !session.is_connected() {
            return Err(PaymentError::NotConnected);
        }
        let sender = session.address().clone();
        let receiver: Address = form.receiver().parse()?;
        let amount = SolAmount::try_from(form.amount())?;

        form.begin_submit();
        let reference = random_reference();
        tracing::debug!(%reference, receiver = %receiver, amount = %amount, "submitting payment");
        let (status, identifier) = match self.attempt(&sender, &receiver, &amount, reference).await
        {
            Ok(signature) => {
                tracing::info!(%signature, %reference, "payment confirmed");
                (TransactionStatus::Completed, signature.to_string())
            }
            Err(error) => {
                tracing::error!(%error, %reference, "payment submission failed");
                (TransactionStatus::Failed, "-".to_string())
            }
        };

        // The attempt happened either way, so the composer closes even if
        // the receipt cannot be persisted.
        let recorded = self
            .ledger
            .record(ReceiptDraft {
                sender: Party {
                    avatar: session.avatar().to_string(),
                    address: sender,
                    verified: true,
                },
                receiver: Party {
                    avatar: self.avatars.avatar_url(&receiver),
                    address: receiver,
                    verified: false,
                },
                description: form.purpose().to_string(),
                timestamp: UnixTimestamp::now(),
                status,
                amount: amount.value(),
                source: self.network_label.clone(),
                identifier,
            })
            .map(TransactionReceipt::clone);
        form.close_and_reset();
        Ok(recorded?)
    }

    /// One signing/broadcast/confirmation attempt.
    ///
    /// Confirmation polls until the RPC reports the commitment reached; no
    /// local timeout is imposed.
    async fn attempt(
        &self,
        from: &Address,
        to: &Address,
        amount: &SolAmount,
        reference: Pubkey,
    ) -> Result<Signature, PaymentError> {
        let request =
            build_transfer_request(&self.rpc, from, to, amount, reference, self.freshness).await?;
        let signature = self.wallet.send_transaction(request.transaction).await?;
        loop {
            let confirmed = self
                .rpc
                .confirm_signature(&signature, self.confirmation)
                .await
                .map_err(SubmissionError::from)?;
            if confirmed.value {
                return Ok(signature);
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryStore;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use solana_client::client_error::ClientError;
    use solana_client::rpc_response::{Response, RpcResponseContext, RpcResult};
    use solana_keypair::Keypair;
    use solana_signer::Signer;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StubRpc {
        pending_confirmations: AtomicU32,
    }

    impl StubRpc {
        fn immediate() -> Self {
            Self {
                pending_confirmations: AtomicU32::new(0),
            }
        }

        fn confirm_after(polls: u32) -> Self {
            Self {
                pending_confirmations: AtomicU32::new(polls),
            }
        }
    }

    impl RpcClientLike for StubRpc {
        fn latest_blockhash(
            &self,
            _commitment: CommitmentConfig,
        ) -> impl Future<Output = Result<Hash, ClientError>> + Send {
            async { Ok(Hash::default()) }
        }

        fn send_transaction(
            &self,
            transaction: &VersionedTransaction,
        ) -> impl Future<Output = Result<Signature, ClientError>> + Send {
            let signature = transaction.signatures.first().copied().unwrap_or_default();
            async move { Ok(signature) }
        }

        fn confirm_signature(
            &self,
            _signature: &Signature,
            _commitment: CommitmentConfig,
        ) -> impl Future<Output = RpcResult<bool>> + Send {
            let remaining = self
                .pending_confirmations
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
                .unwrap();
            async move {
                Ok(Response {
                    context: RpcResponseContext {
                        slot: 0,
                        api_version: None,
                    },
                    value: remaining == 0,
                })
            }
        }
    }

    struct StubWallet {
        fail: bool,
    }

    #[async_trait]
    impl WalletAdapter for StubWallet {
        async fn send_transaction(
            &self,
            _transaction: VersionedTransaction,
        ) -> Result<Signature, SubmissionError> {
            if self.fail {
                return Err(SubmissionError::InvalidTransaction(
                    "wallet refused to sign".to_string(),
                ));
            }
            Ok(Signature::from([7u8; 64]))
        }
    }

    struct StubAvatars;

    impl AvatarSource for StubAvatars {
        fn avatar_url(&self, address: &Address) -> String {
            format!("avatar:{address}")
        }
    }

    fn connected_session(address: &Address) -> WalletSession {
        let mut session = WalletSession::default();
        session.on_connection_change(true, Some(address.clone()), &StubAvatars);
        session
    }

    fn filled_form(receiver: &Address, amount: &str, purpose: &str) -> ComposerForm {
        let mut form = ComposerForm::default();
        form.open();
        form.set_receiver(receiver.to_string());
        form.set_amount(Decimal::from_str(amount).unwrap());
        form.set_purpose(purpose);
        form
    }

    fn submitter(
        wallet: StubWallet,
        rpc: StubRpc,
    ) -> PaymentSubmitter<StubWallet, StubRpc, MemoryStore, StubAvatars> {
        let config = PayflowConfig::default();
        let ledger =
            TransactionLedger::load(MemoryStore::new(), config.ledger_key.as_str()).unwrap();
        PaymentSubmitter::new(&config, wallet, rpc, StubAvatars, ledger)
    }

    #[tokio::test]
    async fn completed_payment_is_recorded_and_form_reset() {
        let sender = Address::from(Keypair::new().pubkey());
        let receiver = Address::from(Keypair::new().pubkey());
        let session = connected_session(&sender);
        let mut form = filled_form(&receiver, "1.5", "lunch");

        let mut submitter = submitter(StubWallet { fail: false }, StubRpc::immediate());
        let receipt = submitter.submit_payment(&session, &mut form).await.unwrap();

        assert_eq!(receipt.id, "1");
        assert_eq!(receipt.status, TransactionStatus::Completed);
        assert_eq!(receipt.amount, Decimal::from_str("1.5").unwrap());
        assert_eq!(receipt.sender.address, sender);
        assert!(receipt.sender.verified);
        assert_eq!(receipt.sender.avatar, format!("avatar:{sender}"));
        assert_eq!(receipt.receiver.address, receiver);
        assert!(!receipt.receiver.verified);
        assert_eq!(receipt.receiver.avatar, format!("avatar:{receiver}"));
        assert_eq!(receipt.description, "lunch");
        assert_eq!(receipt.source, "devnet");
        assert_eq!(receipt.identifier, Signature::from([7u8; 64]).to_string());

        assert_eq!(submitter.ledger().len(), 1);
        assert_eq!(form, ComposerForm::default());
    }

    #[tokio::test]
    async fn repeated_submissions_yield_contiguous_ids() {
        let sender = Address::from(Keypair::new().pubkey());
        let receiver = Address::from(Keypair::new().pubkey());
        let session = connected_session(&sender);

        let mut submitter = submitter(StubWallet { fail: false }, StubRpc::immediate());
        for i in 0..3 {
            let mut form = filled_form(&receiver, "0.25", &format!("payment {i}"));
            submitter.submit_payment(&session, &mut form).await.unwrap();
        }

        let ids: Vec<&str> = submitter
            .ledger()
            .receipts()
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, ["3", "2", "1"]);
    }

    #[tokio::test]
    async fn disconnected_session_is_rejected_without_ledger_write() {
        let receiver = Address::from(Keypair::new().pubkey());
        let session = WalletSession::default();
        let mut form = filled_form(&receiver, "1.5", "lunch");

        let mut submitter = submitter(StubWallet { fail: false }, StubRpc::immediate());
        let err = submitter.submit_payment(&session, &mut form).await;

        assert!(matches!(err, Err(PaymentError::NotConnected)));
        assert!(submitter.ledger().is_empty());
        // The composer stays open for the user to retry after connecting.
        assert_eq!(form.state(), crate::session::ComposerState::Open);
    }

    #[tokio::test]
    async fn malformed_receiver_is_rejected_without_ledger_write() {
        let sender = Address::from(Keypair::new().pubkey());
        let session = connected_session(&sender);
        let mut form = ComposerForm::default();
        form.open();
        form.set_receiver("too-short-to-be-an-address");
        form.set_amount(Decimal::ONE);

        let mut submitter = submitter(StubWallet { fail: false }, StubRpc::immediate());
        let err = submitter.submit_payment(&session, &mut form).await;

        assert!(matches!(err, Err(PaymentError::InvalidAddress(_))));
        assert!(submitter.ledger().is_empty());
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected_without_ledger_write() {
        let sender = Address::from(Keypair::new().pubkey());
        let receiver = Address::from(Keypair::new().pubkey());
        let session = connected_session(&sender);
        let mut form = filled_form(&receiver, "0", "nothing");

        let mut submitter = submitter(StubWallet { fail: false }, StubRpc::immediate());
        let err = submitter.submit_payment(&session, &mut form).await;

        assert!(matches!(
            err,
            Err(PaymentError::InvalidAmount(AmountError::NotPositive))
        ));
        assert!(submitter.ledger().is_empty());
    }

    #[tokio::test]
    async fn failed_submission_records_failed_receipt() {
        let sender = Address::from(Keypair::new().pubkey());
        let receiver = Address::from(Keypair::new().pubkey());
        let session = connected_session(&sender);
        let mut form = filled_form(&receiver, "1.5", "lunch");

        let mut submitter = submitter(StubWallet { fail: true }, StubRpc::immediate());
        let receipt = submitter.submit_payment(&session, &mut form).await.unwrap();

        assert_eq!(receipt.status, TransactionStatus::Failed);
        assert_eq!(receipt.identifier, "-");
        assert_eq!(submitter.ledger().len(), 1);
        assert_eq!(form, ComposerForm::default());
    }

    struct BrokenStore;

    impl ReceiptStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<serde_json::Value>, StoreError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: serde_json::Value) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("store offline")))
        }
    }

    #[tokio::test]
    async fn storage_failure_surfaces_but_still_closes_the_composer() {
        let sender = Address::from(Keypair::new().pubkey());
        let receiver = Address::from(Keypair::new().pubkey());
        let session = connected_session(&sender);
        let mut form = filled_form(&receiver, "1.5", "lunch");

        let config = PayflowConfig::default();
        let ledger = TransactionLedger::load(BrokenStore, config.ledger_key.as_str()).unwrap();
        let mut submitter = PaymentSubmitter::new(
            &config,
            StubWallet { fail: false },
            StubRpc::immediate(),
            StubAvatars,
            ledger,
        );

        let err = submitter.submit_payment(&session, &mut form).await;
        assert!(matches!(err, Err(PaymentError::Storage(_))));
        assert!(submitter.ledger().is_empty());
        assert_eq!(form, ComposerForm::default());
    }

    #[tokio::test]
    async fn confirmation_polls_until_reached() {
        let sender = Address::from(Keypair::new().pubkey());
        let receiver = Address::from(Keypair::new().pubkey());
        let session = connected_session(&sender);
        let mut form = filled_form(&receiver, "0.1", "slow network");

        let mut submitter = submitter(StubWallet { fail: false }, StubRpc::confirm_after(2));
        let receipt = submitter.submit_payment(&session, &mut form).await.unwrap();

        assert_eq!(receipt.status, TransactionStatus::Completed);
    }

    #[test]
    fn transfer_request_embeds_reference_and_anchor() {
        let sender = Address::from(Keypair::new().pubkey());
        let receiver = Address::from(Keypair::new().pubkey());
        let reference = random_reference();
        let blockhash = Hash::default();

        let request =
            transfer_request(&sender, &receiver, 1_500_000_000, reference, blockhash).unwrap();

        assert_eq!(request.lamports, 1_500_000_000);
        assert_eq!(request.reference, reference);
        let keys = request.transaction.message.static_account_keys();
        assert_eq!(keys[0], *sender.pubkey()); // fee payer first
        assert!(keys.contains(receiver.pubkey()));
        assert!(keys.contains(&reference));
        match &request.transaction.message {
            VersionedMessage::V0(message) => {
                assert_eq!(message.recent_blockhash, blockhash);
            }
            VersionedMessage::Legacy(_) => panic!("expected a v0 message"),
        }
        assert!(request.transaction.signatures.is_empty());
    }

    #[test]
    fn references_are_unpredictable() {
        assert_ne!(random_reference(), random_reference());
    }
}
