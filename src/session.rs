//! Wallet session and payment composer state.
//!
//! [`WalletSession`] mirrors the external wallet's connection state and is
//! recomputed on every [`on_connection_change`](WalletSession::on_connection_change)
//! event. [`ComposerForm`] holds the in-progress payment fields and the modal
//! state machine `Closed -> Open -> Submitting -> Closed`.

use rust_decimal::Decimal;

use crate::avatar::AvatarSource;
use crate::chain::Address;

/// The connected wallet as this crate sees it.
///
/// Defaults to a disconnected session: the system-program sentinel address
/// and no avatar.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WalletSession {
    connected: bool,
    address: Address,
    avatar: String,
}

impl WalletSession {
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn avatar(&self) -> &str {
        &self.avatar
    }

    /// Applies a connection-state change reported by the wallet adapter.
    ///
    /// On connect, stores the address and derives the avatar through
    /// `avatars`; on disconnect (or a connect without an address), falls back
    /// to the disconnected defaults.
    pub fn on_connection_change<A: AvatarSource>(
        &mut self,
        connected: bool,
        address: Option<Address>,
        avatars: &A,
    ) {
        match (connected, address) {
            (true, Some(address)) => {
                tracing::debug!(%address, "wallet connected");
                self.avatar = avatars.avatar_url(&address);
                self.address = address;
                self.connected = true;
            }
            _ => {
                tracing::debug!("wallet disconnected");
                *self = WalletSession::default();
            }
        }
    }
}

/// Modal state of the payment composer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ComposerState {
    #[default]
    Closed,
    Open,
    Submitting,
}

/// In-progress payment form fields, owned by the UI interaction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComposerForm {
    amount: Decimal,
    receiver: String,
    purpose: String,
    state: ComposerState,
}

impl ComposerForm {
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn state(&self) -> ComposerState {
        self.state
    }

    pub fn set_amount(&mut self, amount: Decimal) {
        self.amount = amount;
    }

    pub fn set_receiver(&mut self, receiver: impl Into<String>) {
        self.receiver = receiver.into();
    }

    pub fn set_purpose(&mut self, purpose: impl Into<String>) {
        self.purpose = purpose.into();
    }

    /// Opens the composer modal.
    pub fn open(&mut self) {
        self.state = ComposerState::Open;
    }

    /// Marks the form as mid-submission. Fields stay intact so a receipt can
    /// still be built from them.
    pub fn begin_submit(&mut self) {
        self.state = ComposerState::Submitting;
    }

    /// Closes the modal and clears every field.
    pub fn close_and_reset(&mut self) {
        *self = ComposerForm::default();
    }
}
