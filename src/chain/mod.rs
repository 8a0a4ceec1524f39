//! Solana chain layer: addresses, the RPC seam, and the wallet seam.
//!
//! Everything that touches the network or a private key sits behind a trait
//! here, so the payment flow in [`crate::submit`] stays testable without a
//! validator or a browser wallet.

pub mod rpc;
pub mod wallet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use solana_pubkey::Pubkey;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

pub use rpc::RpcClientLike;
pub use wallet::{KeypairWallet, SubmissionError, WalletAdapter};

/// A Solana account address.
///
/// Wraps [`Pubkey`] with base58 string serialization, which is how addresses
/// travel through receipts, persisted ledgers, and user input. The default
/// value is the system program address (`1111...1111`), used as the
/// disconnected-session sentinel.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct Address(Pubkey);

impl Address {
    /// Wraps an existing [`Pubkey`].
    pub const fn new(pubkey: Pubkey) -> Self {
        Self(pubkey)
    }

    /// Borrows the underlying [`Pubkey`].
    pub fn pubkey(&self) -> &Pubkey {
        &self.0
    }
}

/// Error returned when a string is not a base58 Solana address.
#[derive(Debug, thiserror::Error)]
#[error("not a valid Solana address: {0}")]
pub struct AddressParseError(pub String);

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pubkey = Pubkey::from_str(s).map_err(|_| AddressParseError(s.to_string()))?;
        Ok(Self(pubkey))
    }
}

impl From<Pubkey> for Address {
    fn from(pubkey: Pubkey) -> Self {
        Self(pubkey)
    }
}

impl From<Address> for Pubkey {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_keypair::Keypair;
    use solana_signer::Signer;

    #[test]
    fn default_is_system_program_sentinel() {
        assert_eq!(
            Address::default().to_string(),
            "11111111111111111111111111111111"
        );
    }

    #[test]
    fn parses_and_displays_base58() {
        let pubkey = Keypair::new().pubkey();
        let address: Address = pubkey.to_string().parse().unwrap();
        assert_eq!(address.pubkey(), &pubkey);
        assert_eq!(address.to_string(), pubkey.to_string());
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!("tooshort".parse::<Address>().is_err());
        assert!("".parse::<Address>().is_err());
    }

    #[test]
    fn serde_uses_base58_strings() {
        let address = Address::from(Keypair::new().pubkey());
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{address}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}
