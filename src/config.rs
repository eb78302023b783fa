//! Call configuration: the description of one pipelined call.

use crate::decoder::{Decoder, JsonDecoder, YamlDecoder};
use crate::mutator::{self, Mutator, SharedMutator};
use crate::{Context, Result};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

/// Attempts made when the caller does not set a budget.
pub const DEFAULT_ATTEMPTS: usize = 3;

/// Method used until the caller sets one or attaches a body.
pub const DEFAULT_METHOD: &str = "GET";

/// Everything needed to make one call: where, how, what to send, how to
/// prepare each attempt, and how to decode the answer.
///
/// Nothing is validated while building. A malformed target or method is
/// reported by [`crate::execute`] as [`crate::Error::Construction`].
///
/// # Examples
///
/// ```no_run
/// use fetchline::{mutator, CallConfig, Context, JsonDecoder};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Item {
///     name: String,
/// }
///
/// # async fn example() -> Result<(), fetchline::Error> {
/// let config = CallConfig::new("https://example.test/items", JsonDecoder::<Item>::new())
///     .with_attempts(5)
///     .with_body(r#"{"query":"rust"}"#)
///     .with_mutator(mutator::content_type("application/json"));
///
/// assert_eq!(config.method(), "POST");
///
/// let item = config.execute(&Context::background()).await?;
/// println!("{}", item.name);
/// # Ok(())
/// # }
/// ```
pub struct CallConfig<T> {
    attempts: usize,
    target: String,
    method: String,
    body: Bytes,
    mutators: Vec<SharedMutator>,
    decoder: Arc<dyn Decoder<T>>,
}

impl<T> CallConfig<T> {
    /// Creates a configuration for `target` decoded by `decoder`.
    ///
    /// Starts with [`DEFAULT_ATTEMPTS`] attempts, method [`DEFAULT_METHOD`],
    /// an empty body and the [`mutator::defaults`] pipeline.
    pub fn new(target: impl Into<String>, decoder: impl Decoder<T> + 'static) -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            target: target.into(),
            method: DEFAULT_METHOD.to_string(),
            body: Bytes::new(),
            mutators: mutator::defaults(),
            decoder: Arc::new(decoder),
        }
    }

    /// Sets the attempt budget. Zero is treated as one.
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Sets the target address.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Sets the HTTP method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Attaches a pre-serialized body.
    ///
    /// If the method is still [`DEFAULT_METHOD`] it becomes `POST`; any other
    /// method is kept.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        if self.method == DEFAULT_METHOD {
            self.method = "POST".to_string();
        }
        self.body = body.into();
        self
    }

    /// Replaces the whole mutator pipeline, defaults included.
    ///
    /// [`pipeline!`](crate::pipeline) builds the list from mixed mutator types.
    pub fn with_mutators(mut self, mutators: impl IntoIterator<Item = SharedMutator>) -> Self {
        self.mutators = mutators.into_iter().collect();
        self
    }

    /// Appends one mutator to the end of the pipeline.
    pub fn with_mutator(mut self, mutator: impl Mutator + 'static) -> Self {
        self.mutators.push(Arc::new(mutator));
        self
    }

    /// Replaces the decoder.
    pub fn with_decoder(mut self, decoder: impl Decoder<T> + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Decodes the body as JSON with the default accepted statuses.
    pub fn with_json_decoder(self) -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.with_decoder(JsonDecoder::<T>::new())
    }

    /// Decodes the body as YAML with the default accepted statuses.
    pub fn with_yaml_decoder(self) -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.with_decoder(YamlDecoder::<T>::new())
    }

    /// The attempt budget.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// The target address, unvalidated.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The HTTP method, unvalidated.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The mutator pipeline, in execution order.
    pub fn mutators(&self) -> &[SharedMutator] {
        &self.mutators
    }

    /// The decoder.
    pub fn decoder(&self) -> &dyn Decoder<T> {
        self.decoder.as_ref()
    }

    /// Runs the call. Shorthand for [`crate::execute`].
    pub async fn execute(&self, ctx: &Context) -> Result<T> {
        crate::execute(self, ctx).await
    }
}

impl<T> Clone for CallConfig<T> {
    fn clone(&self) -> Self {
        Self {
            attempts: self.attempts,
            target: self.target.clone(),
            method: self.method.clone(),
            body: self.body.clone(),
            mutators: self.mutators.clone(),
            decoder: Arc::clone(&self.decoder),
        }
    }
}

impl<T> fmt::Debug for CallConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallConfig")
            .field("attempts", &self.attempts)
            .field("target", &self.target)
            .field("method", &self.method)
            .field("body_len", &self.body.len())
            .field("mutators", &self.mutators.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{BytesDecoder, TextDecoder};

    fn config() -> CallConfig<String> {
        CallConfig::new("https://example.test/data", TextDecoder::new())
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.attempts(), DEFAULT_ATTEMPTS);
        assert_eq!(config.target(), "https://example.test/data");
        assert_eq!(config.method(), "GET");
        assert!(config.body().is_empty());
        assert_eq!(config.mutators().len(), 2);
    }

    #[test]
    fn test_body_upgrades_default_method() {
        let config = config().with_body("payload");
        assert_eq!(config.method(), "POST");
        assert_eq!(&config.body()[..], b"payload");
    }

    #[test]
    fn test_body_keeps_explicit_method() {
        let config = config().with_method("PUT").with_body("payload");
        assert_eq!(config.method(), "PUT");
    }

    #[test]
    fn test_method_after_body_wins() {
        let config = config().with_body("payload").with_method("PATCH");
        assert_eq!(config.method(), "PATCH");
    }

    #[test]
    fn test_explicit_get_is_still_upgraded() {
        let config = config().with_method("GET").with_body(vec![1u8, 2, 3]);
        assert_eq!(config.method(), "POST");
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(config().with_attempts(0).attempts(), 1);
        assert_eq!(config().with_attempts(7).attempts(), 7);
    }

    #[test]
    fn test_mutator_append_and_replace() {
        let config = config().with_mutator(mutator::content_type("text/plain"));
        assert_eq!(config.mutators().len(), 3);

        let config = config.with_mutators(Vec::new());
        assert!(config.mutators().is_empty());

        let config = config.with_mutators(mutator::defaults());
        assert_eq!(config.mutators().len(), 2);

        let config = config.with_mutators(crate::pipeline![
            mutator::header("x-a", "1"),
            mutator::timeout(std::time::Duration::from_secs(1)),
            mutator::skip_tls_verify(),
        ]);
        assert_eq!(config.mutators().len(), 3);
    }

    #[tokio::test]
    async fn test_decoder_swap_and_clone() {
        let config: CallConfig<Vec<u8>> =
            CallConfig::new("http://a.test", BytesDecoder::new()).with_target("http://b.test");
        let cloned = config.clone();
        assert_eq!(cloned.target(), "http://b.test");
        assert!(format!("{:?}", cloned).contains("b.test"));

        let yaml: CallConfig<serde_json::Value> =
            CallConfig::new("http://a.test", JsonDecoder::new()).with_yaml_decoder();
        let response: reqwest::Response = http::Response::builder()
            .status(200)
            .body("name: x")
            .unwrap()
            .into();
        let value = yaml.decoder().decode(response).await.unwrap();
        assert_eq!(value, serde_json::json!({ "name": "x" }));
    }
}
