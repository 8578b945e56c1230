use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};
use std::fmt::Debug;
use thiserror::Error;

#[cfg(any(test, feature = "mocks"))]
use mockall::automock;

/// Number of hex characters kept from the SHA-256 digest.
pub const ID_LENGTH: usize = 6;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("body is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The store could not be reached within the discovery timeout.
    #[error("store unavailable: {details}")]
    Unavailable { details: String },
    #[error("store query failed: {0}")]
    Query(String),
}

#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait NameRepository: Debug {
    async fn store(&self, record: &NameRecord) -> Result<(), RepositoryError>;
    async fn lookup(&self, id: &str) -> Result<Option<String>, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord {
    pub id: String,
    pub name: String,
}

impl NameRecord {
    pub fn new(id: String, name: String) -> Self {
        Self { id, name }
    }

    /// The id is hashed from the text as received; the stored name is unescaped.
    pub fn from_body(body: &str) -> Self {
        Self::new(derive_id(body), unescape(body))
    }
}

/// Undoes the transport-level base64 encoding of a request body when it is flagged.
pub fn decode_body(body: &str, is_base64_encoded: bool) -> Result<String, DecodeError> {
    if !is_base64_encoded {
        return Ok(body.to_string());
    }
    let bytes = STANDARD.decode(body)?;
    Ok(String::from_utf8(bytes)?)
}

/// First [`ID_LENGTH`] lowercase hex characters of the SHA-256 of `text`.
pub fn derive_id(text: &str) -> String {
    let mut digest = hex::encode(Sha256::digest(text.as_bytes()));
    digest.truncate(ID_LENGTH);
    digest
}

/// Percent-decodes `%XX` escapes. `+` is kept, malformed escapes pass through
/// untouched and invalid UTF-8 becomes U+FFFD.
pub fn unescape(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}

/// Looks a name up, treating an unreachable store the same as a missing id.
pub async fn find_name<R: NameRepository + ?Sized>(repo: &R, id: &str) -> Option<String> {
    match repo.lookup(id).await {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!("Lookup of {} did not complete: {}", id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn derive_id_is_first_six_hex_chars_of_sha256() {
        assert_eq!(derive_id("hello world"), "b94d27");
        assert_eq!(derive_id(""), "e3b0c4");
    }

    #[test]
    fn derive_id_is_always_six_lowercase_hex_chars() {
        for input in ["a", "https://example.com/very/long/path?x=1", "Привет, мир", "🦀"] {
            let id = derive_id(input);
            assert_eq!(id.len(), ID_LENGTH);
            assert!(id
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
            assert_eq!(id, derive_id(input));
        }
    }

    #[test]
    fn decode_body_passes_plain_body_through() {
        assert_eq!(
            decode_body("aGVsbG8gd29ybGQ=", false).unwrap(),
            "aGVsbG8gd29ybGQ="
        );
    }

    #[test]
    fn decode_body_undoes_base64() {
        let encoded = STANDARD.encode("Привет, мир");
        assert_eq!(decode_body(&encoded, true).unwrap(), "Привет, мир");
    }

    #[test]
    fn decode_body_rejects_malformed_base64() {
        assert!(matches!(
            decode_body("not base64!", true),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn decode_body_rejects_non_utf8_payload() {
        let encoded = STANDARD.encode([0xff, 0xfe, 0xfd]);
        assert!(matches!(
            decode_body(&encoded, true),
            Err(DecodeError::Utf8(_))
        ));
    }

    #[test]
    fn unescape_decodes_percent_sequences_like_unquote() {
        assert_eq!(
            unescape("https%3A%2F%2Fexample.com%2F%3Fq%3D1"),
            "https://example.com/?q=1"
        );
        assert_eq!(unescape("a+b"), "a+b");
        assert_eq!(unescape("100%"), "100%");
        assert_eq!(unescape("%zz"), "%zz");
        assert_eq!(unescape("%D0%BC%D0%B8%D1%80"), "мир");
        assert_eq!(unescape("%ff"), "\u{fffd}");
    }

    #[test]
    fn record_from_body_hashes_raw_text_and_stores_unescaped() {
        let record = NameRecord::from_body("a%20b");

        assert_eq!(record.id, derive_id("a%20b"));
        assert_eq!(record.name, "a b");
    }

    #[tokio::test]
    async fn find_name_returns_stored_name() {
        let mut repo = MockNameRepository::default();
        repo.expect_lookup()
            .with(eq("b94d27"))
            .times(1)
            .returning(|_| Ok(Some("hello world".to_string())));

        assert_eq!(
            find_name(&repo, "b94d27").await,
            Some("hello world".to_string())
        );
    }

    #[tokio::test]
    async fn find_name_treats_unavailable_store_as_missing() {
        let mut repo = MockNameRepository::default();
        repo.expect_lookup().times(1).returning(|_| {
            Err(RepositoryError::Unavailable {
                details: "no response within 5s".to_string(),
            })
        });

        assert_eq!(find_name(&repo, "b94d27").await, None);
    }
}
