//! Raw caller identity as delivered by the host runtime.

use std::collections::BTreeMap;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// Attribute claim carrying the caller's numeric record id.
pub const ID_ATTRIBUTE: &str = "id";

/// Caller credential material: the MSP organization, the common name of the
/// certificate issuer, and any attribute claims embedded in the certificate.
///
/// # Example
///
/// ```
/// use beatchain_authn::CallerIdentity;
///
/// let identity = CallerIdentity::new("CreatorMSP", "ca.creatororg.beatchain.com")
///     .with_attribute("id", "100000003");
/// let decoded = CallerIdentity::decode(&identity.encode()).unwrap();
/// assert_eq!(decoded, identity);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    /// Membership service provider id of the caller's organization.
    pub msp_id: String,
    /// Common name of the certificate issuer.
    pub cert_issuer: String,
    /// Attribute claims (`name -> value`).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl CallerIdentity {
    /// Creates an identity without attribute claims.
    pub fn new(msp_id: impl Into<String>, cert_issuer: impl Into<String>) -> Self {
        Self { msp_id: msp_id.into(), cert_issuer: cert_issuer.into(), attributes: BTreeMap::new() }
    }

    /// Adds an attribute claim.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Looks up an attribute claim.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Decodes the base64url (unpadded) JSON envelope a host passes through.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedCredential`] if the envelope is not
    /// valid base64url or does not hold an identity object.
    pub fn decode(envelope: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(envelope.trim())
            .map_err(|e| AuthError::malformed(format!("identity envelope is not base64url: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::malformed(format!("identity envelope is not valid JSON: {e}")))
    }

    /// Encodes the identity as a base64url (unpadded) JSON envelope.
    pub fn encode(&self) -> String {
        // A struct of strings and a string map always serializes.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_accepts_envelope_without_attributes() {
        let json = r#"{"mspId":"BeatchainMSP","certIssuer":"ca.admin.beatchain.com"}"#;
        let envelope = URL_SAFE_NO_PAD.encode(json);

        let identity = CallerIdentity::decode(&envelope).expect("decode");
        assert_eq!(identity.msp_id, "BeatchainMSP");
        assert!(identity.attributes.is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let err = CallerIdentity::decode("not base64!").expect_err("must fail");
        assert!(matches!(err, AuthError::MalformedCredential(ref m) if m.contains("base64url")));
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let envelope = URL_SAFE_NO_PAD.encode(r#"{"org":"x"}"#);
        let err = CallerIdentity::decode(&envelope).expect_err("must fail");
        assert!(matches!(err, AuthError::MalformedCredential(ref m) if m.contains("JSON")));
    }

    #[test]
    fn test_attribute_lookup() {
        let identity = CallerIdentity::new("CustomerMSP", "ca.customerorg.beatchain.com")
            .with_attribute(ID_ATTRIBUTE, "100000002");
        assert_eq!(identity.attribute("id"), Some("100000002"));
        assert_eq!(identity.attribute("role"), None);
    }
}
