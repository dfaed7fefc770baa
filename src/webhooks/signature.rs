//! HMAC-SHA256 webhook signatures.
//!
//! GitHub signs each delivery body with the hook's shared secret and sends the
//! digest in the `X-Hub-Signature-256` header as `sha256=<hex>`. Only the
//! SHA-256 form is accepted; the legacy SHA-1 header is ignored.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Prefix GitHub puts in front of the hex digest.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// A decoded signature digest as carried by the signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Decodes a `sha256=<hex>` header value.
    ///
    /// Returns `None` for a missing prefix, another algorithm, or bad hex.
    ///
    /// ```
    /// use github_robot::webhooks::Signature;
    ///
    /// assert!(Signature::from_header("sha256=abcd1234").is_some());
    /// assert!(Signature::from_header("sha1=abcd1234").is_none());
    /// assert!(Signature::from_header("sha256=xyz").is_none());
    /// ```
    pub fn from_header(header: &str) -> Option<Self> {
        let hex_digest = header.strip_prefix(SIGNATURE_PREFIX)?;
        hex::decode(hex_digest).ok().map(Signature)
    }

    /// Signs `body` with `secret`.
    pub fn compute(secret: &[u8], body: &[u8]) -> Self {
        Signature(keyed(secret, body).finalize().into_bytes().to_vec())
    }

    /// Renders the signature in header form.
    pub fn to_header(&self) -> String {
        format!("{SIGNATURE_PREFIX}{}", hex::encode(&self.0))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Checks this signature against a freshly computed MAC over `body`.
    ///
    /// The comparison is constant-time.
    pub fn matches(&self, secret: &[u8], body: &[u8]) -> bool {
        keyed(secret, body).verify_slice(&self.0).is_ok()
    }
}

/// Verifies a raw signature header value against `body`.
///
/// ```
/// use github_robot::webhooks::{Signature, verify_signature};
///
/// let header = Signature::compute(b"s3cret", b"{}").to_header();
/// assert!(verify_signature(b"s3cret", b"{}", &header));
/// assert!(!verify_signature(b"other", b"{}", &header));
/// ```
pub fn verify_signature(secret: &[u8], body: &[u8], header: &str) -> bool {
    Signature::from_header(header).is_some_and(|sig| sig.matches(secret, body))
}

fn keyed(secret: &[u8], body: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(body);
    mac
}
