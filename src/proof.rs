//! Password proof for the salted login handshake.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// One-way function of (password, server salt) sent instead of the password.
pub trait PasswordProof: Send + Sync {
    fn proof(&self, password: &SecretString, salt: &str) -> String;
}

/// `base64(HMAC-SHA256(key = salt, message = password))`.
#[derive(Clone, Copy, Debug, Default)]
pub struct HmacSha256Proof;

impl PasswordProof for HmacSha256Proof {
    fn proof(&self, password: &SecretString, salt: &str) -> String {
        // HMAC accepts keys of any length, including empty.
        let Ok(mut mac) = HmacSha256::new_from_slice(salt.as_bytes()) else {
            return String::new();
        };
        mac.update(password.expose_secret().as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }
}

impl<F> PasswordProof for F
where
    F: Fn(&str, &str) -> String + Send + Sync,
{
    fn proof(&self, password: &SecretString, salt: &str) -> String {
        self(password.expose_secret(), salt)
    }
}
