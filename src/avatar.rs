//! Deterministic avatar derivation.

use url::Url;

use crate::chain::Address;

/// Derives a stable avatar image URL from an address.
///
/// The derivation must be deterministic: the same address always yields the
/// same URL, so avatars recorded in ledger receipts stay consistent across
/// sessions.
pub trait AvatarSource {
    fn avatar_url(&self, address: &Address) -> String;
}

/// [`AvatarSource`] backed by the DiceBear identicon service.
///
/// Produces `<base>/<address>.svg`; the service renders a deterministic
/// image from the address seed.
#[derive(Clone, Debug)]
pub struct DiceBearAvatars {
    base: Url,
}

impl DiceBearAvatars {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

impl Default for DiceBearAvatars {
    fn default() -> Self {
        let base = Url::parse("https://avatars.dicebear.com/api/jdenticon/")
            .expect("valid default avatar base url");
        Self { base }
    }
}

impl AvatarSource for DiceBearAvatars {
    fn avatar_url(&self, address: &Address) -> String {
        format!("{}{}.svg", self.base, address)
    }
}
