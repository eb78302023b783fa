//! Request mutators: the ordered pipeline run before every attempt.
//!
//! A [`Mutator`] receives the attempt's [`Transport`] settings and the
//! in-flight [`reqwest::Request`] and may change either. Mutators run in
//! order; the first one to fail ends the whole call without retrying.

use crate::{Error, Result};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// User agent sent when the caller does not supply one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/112.0.0.0 Safari/537.36";

/// Client settings for a single attempt.
///
/// A fresh `Transport` is created for every attempt, handed to each mutator,
/// and then turned into a new `reqwest::Client`. Nothing is shared between
/// attempts.
#[derive(Debug, Default)]
pub struct Transport {
    accept_invalid_certs: bool,
    proxy: Option<reqwest::Proxy>,
    timeout: Option<Duration>,
}

impl Transport {
    /// Accept certificates that fail verification.
    pub fn set_accept_invalid_certs(&mut self, accept: bool) {
        self.accept_invalid_certs = accept;
    }

    /// Route all traffic for this attempt through `proxy`.
    pub fn set_proxy(&mut self, proxy: reqwest::Proxy) {
        self.proxy = Some(proxy);
    }

    /// Bound the whole attempt (connect, send, body) by `timeout`.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Whether invalid certificates will be accepted.
    pub fn accepts_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    /// The configured proxy, if any.
    pub fn proxy(&self) -> Option<&reqwest::Proxy> {
        self.proxy.as_ref()
    }

    /// The configured per-attempt timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Builds the client for this attempt.
    ///
    /// Environment proxies are ignored unless a proxy mutator set one.
    pub(crate) fn build(self) -> Result<reqwest::Client> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(self.accept_invalid_certs);

        builder = match self.proxy {
            Some(proxy) => builder.proxy(proxy),
            None => builder.no_proxy(),
        };

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder
            .build()
            .map_err(|e| Error::Construction(format!("Failed to build HTTP client: {}", e)))
    }
}

/// Customizes transport and request state before an attempt.
///
/// Implement this trait for reusable mutators, or wrap a closure with
/// [`from_fn`].
///
/// # Examples
///
/// ```
/// use fetchline::mutator::{Mutator, Transport};
/// use http::HeaderValue;
///
/// struct ApiKey(&'static str);
///
/// impl Mutator for ApiKey {
///     fn apply(&self, _transport: &mut Transport, request: &mut reqwest::Request) -> fetchline::Result<()> {
///         request
///             .headers_mut()
///             .insert("x-api-key", HeaderValue::from_static(self.0));
///         Ok(())
///     }
/// }
/// ```
pub trait Mutator: Send + Sync {
    /// Applies the mutation. An error aborts the call.
    fn apply(&self, transport: &mut Transport, request: &mut reqwest::Request) -> Result<()>;
}

/// Shared handle to a mutator, as stored in a call configuration.
pub type SharedMutator = Arc<dyn Mutator>;

/// A mutator backed by a closure. Created by [`from_fn`].
#[derive(Clone)]
pub struct FnMutator<F>(F);

impl<F> fmt::Debug for FnMutator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnMutator")
    }
}

impl<F> Mutator for FnMutator<F>
where
    F: Fn(&mut Transport, &mut reqwest::Request) -> Result<()> + Send + Sync,
{
    fn apply(&self, transport: &mut Transport, request: &mut reqwest::Request) -> Result<()> {
        (self.0)(transport, request)
    }
}

/// Wraps a closure as a [`Mutator`].
///
/// # Examples
///
/// ```
/// use fetchline::mutator;
///
/// let log_url = mutator::from_fn(|_transport, request| {
///     println!("sending to {}", request.url());
///     Ok(())
/// });
/// ```
pub fn from_fn<F>(f: F) -> FnMutator<F>
where
    F: Fn(&mut Transport, &mut reqwest::Request) -> Result<()> + Send + Sync,
{
    FnMutator(f)
}

/// Sets the `User-Agent` header.
#[derive(Debug, Clone)]
pub struct UserAgent(String);

/// Sets `User-Agent` to `value`.
pub fn user_agent(value: impl Into<String>) -> UserAgent {
    UserAgent(value.into())
}

/// Sets `User-Agent` to [`DEFAULT_USER_AGENT`].
pub fn default_user_agent() -> UserAgent {
    user_agent(DEFAULT_USER_AGENT)
}

impl Mutator for UserAgent {
    fn apply(&self, _transport: &mut Transport, request: &mut reqwest::Request) -> Result<()> {
        let value = HeaderValue::try_from(self.0.as_str())
            .map_err(|e| Error::Mutator(format!("Invalid user agent: {}", e)))?;
        request.headers_mut().insert(USER_AGENT, value);
        Ok(())
    }
}

/// Disables certificate verification for the attempt.
#[derive(Debug, Clone, Copy)]
pub struct SkipTlsVerify;

/// Accept unverified certificates. Part of the default pipeline.
pub fn skip_tls_verify() -> SkipTlsVerify {
    SkipTlsVerify
}

impl Mutator for SkipTlsVerify {
    fn apply(&self, transport: &mut Transport, _request: &mut reqwest::Request) -> Result<()> {
        transport.set_accept_invalid_certs(true);
        Ok(())
    }
}

/// Routes the attempt through a proxy.
#[derive(Debug, Clone)]
pub struct Proxy {
    url: std::result::Result<Url, String>,
}

/// Proxies every request through `url`.
///
/// The address is parsed here, but a malformed one is only reported when the
/// mutator runs, which fails the call.
pub fn proxy(url: impl AsRef<str>) -> Proxy {
    Proxy {
        url: Url::parse(url.as_ref()).map_err(|e| format!("{}: {}", url.as_ref(), e)),
    }
}

impl Mutator for Proxy {
    fn apply(&self, transport: &mut Transport, _request: &mut reqwest::Request) -> Result<()> {
        let url = self
            .url
            .as_ref()
            .map_err(|e| Error::Mutator(format!("Invalid proxy address {}", e)))?;
        let proxy = reqwest::Proxy::all(url.as_str())
            .map_err(|e| Error::Mutator(format!("Invalid proxy address {}: {}", url, e)))?;
        transport.set_proxy(proxy);
        Ok(())
    }
}

/// Sets one request header, replacing any previous value.
#[derive(Debug, Clone)]
pub struct Header {
    name: String,
    value: String,
}

/// Sets header `name` to `value`. Invalid names or values fail the call.
pub fn header(name: impl Into<String>, value: impl Into<String>) -> Header {
    Header {
        name: name.into(),
        value: value.into(),
    }
}

/// Sets `Content-Type` to `value`.
pub fn content_type(value: impl Into<String>) -> Header {
    header(CONTENT_TYPE.as_str(), value)
}

impl Mutator for Header {
    fn apply(&self, _transport: &mut Transport, request: &mut reqwest::Request) -> Result<()> {
        let name = HeaderName::try_from(self.name.as_str())
            .map_err(|e| Error::Mutator(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(self.value.as_str())
            .map_err(|e| Error::Mutator(format!("Invalid header value: {}", e)))?;
        request.headers_mut().insert(name, value);
        Ok(())
    }
}

/// Bounds each attempt by a timeout.
#[derive(Debug, Clone, Copy)]
pub struct Timeout(Duration);

/// Fails an attempt that takes longer than `duration`. The failure is a
/// transport error and is retried.
pub fn timeout(duration: Duration) -> Timeout {
    Timeout(duration)
}

impl Mutator for Timeout {
    fn apply(&self, transport: &mut Transport, _request: &mut reqwest::Request) -> Result<()> {
        transport.set_timeout(self.0);
        Ok(())
    }
}

/// Builds a mutator pipeline from mutators of any type, in order.
///
/// ```
/// use fetchline::{mutator, pipeline, CallConfig, TextDecoder};
///
/// let config: CallConfig<String> = CallConfig::new("https://example.test", TextDecoder::new())
///     .with_mutators(pipeline![mutator::user_agent("my-app/1.0"), mutator::header("x-key", "1")]);
/// assert_eq!(config.mutators().len(), 2);
/// ```
#[macro_export]
macro_rules! pipeline {
    ($($mutator:expr),* $(,)?) => {
        ::std::vec![$(::std::sync::Arc::new($mutator) as $crate::mutator::SharedMutator),*]
    };
}

/// The pipeline every new configuration starts with: the default user agent
/// followed by TLS verification skipping.
pub fn defaults() -> Vec<SharedMutator> {
    crate::pipeline![default_user_agent(), skip_tls_verify()]
}
