//! Local payment-request signing.
//!
//! The peer verifies payment requests server-side against a canonical string:
//! every non-empty field as `key=value`, sorted by key, joined with `&`, with
//! `&key=<secret>` appended. The signature is the uppercase hex MD5 of that
//! string's UTF-8 bytes.

use std::collections::BTreeMap;

/// Named fields to sign.
///
/// Field order is irrelevant: entries are kept sorted by key, and inserting an
/// existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureInput {
    fields: BTreeMap<String, String>,
}

impl SignatureInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Canonical field set of a payment request.
    pub fn for_payment(
        app_id: &str,
        partner_id: &str,
        prepay_id: &str,
        nonce: &str,
        package: &str,
        timestamp: &str,
    ) -> Self {
        Self::new()
            .with("appid", app_id)
            .with("noncestr", nonce)
            .with("package", package)
            .with("partnerid", partner_id)
            .with("prepayid", prepay_id)
            .with("timestamp", timestamp)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `key=value` pairs with empty values skipped, sorted and `&`-joined.
    pub fn canonical_string(&self) -> String {
        self.fields
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K, V> FromIterator<(K, V)> for SignatureInput
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut input = Self::new();
        for (key, value) in iter {
            input.insert(key, value);
        }
        input
    }
}

/// Sign `fields` with `secret`.
pub fn sign(fields: SignatureInput, secret: &str) -> String {
    let canonical = fields.canonical_string();
    let payload = if canonical.is_empty() {
        format!("key={secret}")
    } else {
        format!("{canonical}&key={secret}")
    };
    hex::encode_upper(md5::compute(payload.as_bytes()).0)
}

/// Check `signature` against `fields` signed with `secret`, ignoring hex case.
pub fn verify(fields: SignatureInput, secret: &str, signature: &str) -> bool {
    sign(fields, secret).eq_ignore_ascii_case(signature.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        let input = SignatureInput::new().with("b", "2").with("a", "1");
        assert_eq!(input.canonical_string(), "a=1&b=2");
        assert_eq!(sign(input, "k"), "F8F06AFA2E241A36469B9DAC959B3474");
    }

    #[test]
    fn test_published_example() {
        let input: SignatureInput = [
            ("mch_id", "10000100"),
            ("nonce_str", "ibuaiVcKdpRxkhJA"),
            ("appid", "wxd930ea5d5a258f4f"),
            ("device_info", "1000"),
            ("body", "test"),
        ]
        .into_iter()
        .collect();
        let signature = sign(input.clone(), "192006250b4c09247ec02edce69f6a2d");
        assert_eq!(signature, "9A0A8659F005D6984697E2CA0A9CF3B7");
        assert!(verify(input, "192006250b4c09247ec02edce69f6a2d", &signature));
    }

    #[test]
    fn test_output_is_uppercase_hex() {
        let signature = sign(SignatureInput::new().with("x", "y"), "secret");
        assert_eq!(signature.len(), 32);
        assert!(signature
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_empty_values_are_omitted() {
        let with_empty = SignatureInput::new()
            .with("prepayid", "wx201410272009395522657a690389285100")
            .with("package", "");
        let without =
            SignatureInput::new().with("prepayid", "wx201410272009395522657a690389285100");
        assert_eq!(with_empty.canonical_string(), without.canonical_string());
        assert_eq!(sign(with_empty, "key"), sign(without, "key"));
    }

    #[test]
    fn test_payment_field_set() {
        let input = SignatureInput::for_payment(
            "wx123",
            "1900000109",
            "wx2014",
            "5K8264",
            "Sign=WXPay",
            "1412000000",
        );
        assert_eq!(
            input.canonical_string(),
            "appid=wx123&noncestr=5K8264&package=Sign=WXPay&partnerid=1900000109&prepayid=wx2014&timestamp=1412000000"
        );
    }

    #[test]
    fn test_verify_ignores_case() {
        let input = SignatureInput::new().with("a", "1");
        let signature = sign(input.clone(), "k").to_lowercase();
        assert!(verify(input.clone(), "k", &signature));
        assert!(!verify(input, "other", &signature));
    }
}
