use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing x-line-signature header")]
    Missing,
    #[error("signature is not valid base64")]
    Malformed,
    #[error("signature does not match request body")]
    Mismatch,
    #[error("channel secret is not configured")]
    NoSecret,
}

/// Checks `X-Line-Signature`: base64 HMAC-SHA256 of the raw body keyed by the channel secret.
#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    channel_secret: SecretString,
}

impl SignatureVerifier {
    pub fn new(channel_secret: SecretString) -> Self {
        Self { channel_secret }
    }

    pub fn sign(&self, body: &[u8]) -> Result<String, SignatureError> {
        let mac = self.mac(body)?;
        Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), SignatureError> {
        let signature = signature.map(str::trim).filter(|value| !value.is_empty());
        let signature = signature.ok_or(SignatureError::Missing)?;
        let expected =
            general_purpose::STANDARD.decode(signature).map_err(|_| SignatureError::Malformed)?;

        // verify_slice compares in constant time.
        self.mac(body)?.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)
    }

    fn mac(&self, body: &[u8]) -> Result<HmacSha256, SignatureError> {
        let secret = self.channel_secret.expose_secret();
        if secret.is_empty() {
            return Err(SignatureError::NoSecret);
        }
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::NoSecret)?;
        mac.update(body);
        Ok(mac)
    }
}
