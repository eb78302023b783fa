//! Status-gated response decoders.
//!
//! [`BytesDecoder`] is the base layer: it checks the status against an
//! accepted set and reads the whole body. The structured decoders
//! ([`JsonDecoder`], [`YamlDecoder`]) run it first and then parse the bytes
//! into the target type, keeping the raw body in the error if parsing fails.
//!
//! Every decoder takes the response by value, so the body stream is released
//! as soon as `decode` returns, whatever the outcome.

use crate::error::{BoxError, Format};
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;

/// Converts a raw response into a typed value.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use fetchline::decoder::{BytesDecoder, Decoder};
///
/// /// Counts the lines of a text body.
/// struct LineCount(BytesDecoder);
///
/// #[async_trait]
/// impl Decoder<usize> for LineCount {
///     async fn decode(&self, response: reqwest::Response) -> fetchline::Result<usize> {
///         let (_, body) = self.0.read(response).await?;
///         Ok(body.split(|b| *b == b'\n').count())
///     }
/// }
/// ```
#[async_trait]
pub trait Decoder<T>: Send + Sync {
    /// Decodes `response`. Errors are treated as retryable by the engine.
    async fn decode(&self, response: reqwest::Response) -> Result<T>;
}

/// Reads the raw body of responses whose status is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytesDecoder {
    accepted: Vec<StatusCode>,
}

impl BytesDecoder {
    /// Statuses read when none are given. 404 is included so callers can
    /// inspect "not found" payloads.
    pub const DEFAULT_ACCEPTED: [StatusCode; 2] = [StatusCode::OK, StatusCode::NOT_FOUND];

    /// A decoder accepting [`BytesDecoder::DEFAULT_ACCEPTED`].
    pub fn new() -> Self {
        Self {
            accepted: Self::DEFAULT_ACCEPTED.to_vec(),
        }
    }

    /// A decoder accepting exactly `statuses`. An empty set falls back to the
    /// defaults.
    pub fn accepting(statuses: impl IntoIterator<Item = StatusCode>) -> Self {
        let accepted: Vec<StatusCode> = statuses.into_iter().collect();
        if accepted.is_empty() {
            return Self::new();
        }
        Self { accepted }
    }

    /// The statuses whose body will be read.
    pub fn accepted(&self) -> &[StatusCode] {
        &self.accepted
    }

    /// Returns `true` if `status` is in the accepted set.
    pub fn accepts(&self, status: StatusCode) -> bool {
        self.accepted.contains(&status)
    }

    /// Gates on status and reads the full body.
    ///
    /// # Errors
    ///
    /// [`Error::Status`] if the status is not accepted (the body is not read),
    /// [`Error::Body`] if reading the body fails.
    pub async fn read(&self, response: reqwest::Response) -> Result<(StatusCode, Bytes)> {
        let status = response.status();

        if !self.accepts(status) {
            tracing::debug!(
                status = status.as_u16(),
                accepted = ?self.accepted,
                "Rejecting response status"
            );
            return Err(Error::Status {
                status,
                accepted: self.accepted.clone(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| Error::Body { status, source })?;

        Ok((status, body))
    }
}

impl Default for BytesDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Decoder<Bytes> for BytesDecoder {
    async fn decode(&self, response: reqwest::Response) -> Result<Bytes> {
        let (_, body) = self.read(response).await?;
        Ok(body)
    }
}

#[async_trait]
impl Decoder<Vec<u8>> for BytesDecoder {
    async fn decode(&self, response: reqwest::Response) -> Result<Vec<u8>> {
        let (_, body) = self.read(response).await?;
        Ok(body.to_vec())
    }
}

/// Reads the body as text, replacing invalid UTF-8.
#[derive(Debug, Clone, Default)]
pub struct TextDecoder {
    bytes: BytesDecoder,
}

impl TextDecoder {
    /// A text decoder with the default accepted statuses.
    pub fn new() -> Self {
        Self::default()
    }

    /// A text decoder accepting exactly `statuses`.
    pub fn accepting(statuses: impl IntoIterator<Item = StatusCode>) -> Self {
        Self {
            bytes: BytesDecoder::accepting(statuses),
        }
    }
}

#[async_trait]
impl Decoder<String> for TextDecoder {
    async fn decode(&self, response: reqwest::Response) -> Result<String> {
        let (_, body) = self.bytes.read(response).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

fn parse_failure<T>(format: Format, status: StatusCode, body: &[u8], source: BoxError) -> Error {
    let raw_body = String::from_utf8_lossy(body).into_owned();
    let type_name = std::any::type_name::<T>();

    tracing::error!(
        error = %source,
        format = %format,
        type_name = type_name,
        raw_response = %raw_body,
        "Failed to deserialize response"
    );

    Error::Deserialization {
        format,
        type_name,
        status,
        raw_body,
        source,
    }
}

/// Parses a JSON body into `T`.
pub struct JsonDecoder<T> {
    bytes: BytesDecoder,
    _target: PhantomData<fn() -> T>,
}

impl<T> JsonDecoder<T> {
    /// A JSON decoder with the default accepted statuses.
    pub fn new() -> Self {
        Self::with_bytes(BytesDecoder::new())
    }

    /// A JSON decoder accepting exactly `statuses`.
    pub fn accepting(statuses: impl IntoIterator<Item = StatusCode>) -> Self {
        Self::with_bytes(BytesDecoder::accepting(statuses))
    }

    fn with_bytes(bytes: BytesDecoder) -> Self {
        Self {
            bytes,
            _target: PhantomData,
        }
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonDecoder<T> {
    fn clone(&self) -> Self {
        Self::with_bytes(self.bytes.clone())
    }
}

impl<T> fmt::Debug for JsonDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDecoder")
            .field("target", &std::any::type_name::<T>())
            .field("accepted", &self.bytes.accepted)
            .finish()
    }
}

#[async_trait]
impl<T> Decoder<T> for JsonDecoder<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn decode(&self, response: reqwest::Response) -> Result<T> {
        let (status, body) = self.bytes.read(response).await?;
        serde_json::from_slice(&body)
            .map_err(|e| parse_failure::<T>(Format::Json, status, &body, Box::new(e)))
    }
}

/// Parses a YAML body into `T`.
pub struct YamlDecoder<T> {
    bytes: BytesDecoder,
    _target: PhantomData<fn() -> T>,
}

impl<T> YamlDecoder<T> {
    /// A YAML decoder with the default accepted statuses.
    pub fn new() -> Self {
        Self::with_bytes(BytesDecoder::new())
    }

    /// A YAML decoder accepting exactly `statuses`.
    pub fn accepting(statuses: impl IntoIterator<Item = StatusCode>) -> Self {
        Self::with_bytes(BytesDecoder::accepting(statuses))
    }

    fn with_bytes(bytes: BytesDecoder) -> Self {
        Self {
            bytes,
            _target: PhantomData,
        }
    }
}

impl<T> Default for YamlDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for YamlDecoder<T> {
    fn clone(&self) -> Self {
        Self::with_bytes(self.bytes.clone())
    }
}

impl<T> fmt::Debug for YamlDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YamlDecoder")
            .field("target", &std::any::type_name::<T>())
            .field("accepted", &self.bytes.accepted)
            .finish()
    }
}

#[async_trait]
impl<T> Decoder<T> for YamlDecoder<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn decode(&self, response: reqwest::Response) -> Result<T> {
        let (status, body) = self.bytes.read(response).await?;
        serde_yaml::from_slice(&body)
            .map_err(|e| parse_failure::<T>(Format::Yaml, status, &body, Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Item {
        name: String,
        tags: Vec<String>,
    }

    fn response(status: u16, body: impl Into<String>) -> reqwest::Response {
        http::Response::builder()
            .status(status)
            .body(body.into())
            .unwrap()
            .into()
    }

    fn item() -> Item {
        Item {
            name: "x".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
        }
    }

    #[tokio::test]
    async fn test_bytes_default_accepts_200_and_404() {
        let decoder = BytesDecoder::new();

        let ok: Bytes = decoder.decode(response(200, "hello")).await.unwrap();
        assert_eq!(&ok[..], b"hello");

        let missing: Bytes = decoder.decode(response(404, "gone")).await.unwrap();
        assert_eq!(&missing[..], b"gone");
    }

    #[tokio::test]
    async fn test_bytes_rejects_500() {
        let decoder = BytesDecoder::new();
        let result: Result<Bytes> = decoder.decode(response(500, "boom")).await;

        match result {
            Err(Error::Status { status, accepted }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(accepted, BytesDecoder::DEFAULT_ACCEPTED.to_vec());
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_custom_accepted_set() {
        let decoder = BytesDecoder::accepting([StatusCode::CREATED]);
        assert!(!decoder.accepts(StatusCode::OK));

        let body: Vec<u8> = decoder.decode(response(201, "made")).await.unwrap();
        assert_eq!(body, b"made");

        let rejected: Result<Vec<u8>> = decoder.decode(response(200, "ok")).await;
        assert!(matches!(rejected, Err(Error::Status { .. })));
    }

    #[test]
    fn test_empty_accepted_set_falls_back() {
        let decoder = BytesDecoder::accepting(Vec::new());
        assert_eq!(decoder, BytesDecoder::new());
    }

    #[tokio::test]
    async fn test_text_decoder() {
        let text = TextDecoder::new()
            .decode(response(200, "plain text"))
            .await
            .unwrap();
        assert_eq!(text, "plain text");
    }

    #[tokio::test]
    async fn test_json_round_trip() {
        let encoded = serde_json::to_string(&item()).unwrap();
        let decoded = JsonDecoder::<Item>::new()
            .decode(response(200, encoded))
            .await
            .unwrap();
        assert_eq!(decoded, item());
    }

    #[tokio::test]
    async fn test_yaml_round_trip() {
        let encoded = serde_yaml::to_string(&item()).unwrap();
        let decoded = YamlDecoder::<Item>::new()
            .decode(response(200, encoded))
            .await
            .unwrap();
        assert_eq!(decoded, item());
    }

    #[tokio::test]
    async fn test_json_parse_failure_carries_diagnostics() {
        let result = JsonDecoder::<Item>::new()
            .decode(response(200, "{\"name\": 5}"))
            .await;

        match result {
            Err(Error::Deserialization {
                format,
                type_name,
                status,
                raw_body,
                source,
            }) => {
                assert_eq!(format, Format::Json);
                assert!(type_name.ends_with("Item"));
                assert_eq!(status, StatusCode::OK);
                assert_eq!(raw_body, "{\"name\": 5}");
                assert!(source.to_string().contains("invalid type"));
            }
            other => panic!("Expected Deserialization error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_yaml_parse_failure() {
        let result = YamlDecoder::<Item>::new()
            .decode(response(404, "just a string"))
            .await;

        match result {
            Err(err @ Error::Deserialization { .. }) => {
                assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
                assert_eq!(err.raw_body(), Some("just a string"));
                assert!(err.to_string().contains("yaml"));
            }
            other => panic!("Expected Deserialization error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_structured_status_gate_runs_first() {
        let result = JsonDecoder::<Item>::new()
            .decode(response(503, "not json"))
            .await;
        assert!(matches!(result, Err(Error::Status { .. })));
    }
}
