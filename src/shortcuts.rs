//! Ready-made calls for the common cases.
//!
//! Each function builds a [`CallConfig`] and runs it. The `*_with` variants
//! take a prepared configuration (attempt budget, extra mutators, a proxy...)
//! and override only its target and decoder.

use crate::decoder::{BytesDecoder, JsonDecoder, YamlDecoder};
use crate::mutator;
use crate::{execute, CallConfig, Context, Error, Result};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

const JSON_CONTENT_TYPE: &str = "application/json";

/// GETs `url` and returns the raw body.
pub async fn get_bytes(ctx: &Context, url: impl Into<String>) -> Result<Bytes> {
    let url = url.into();
    let config = CallConfig::new(url.clone(), BytesDecoder::new());
    get_bytes_with(ctx, url, config).await
}

/// Like [`get_bytes`], starting from `config`.
pub async fn get_bytes_with(
    ctx: &Context,
    url: impl Into<String>,
    config: CallConfig<Bytes>,
) -> Result<Bytes> {
    let config = config.with_target(url).with_decoder(BytesDecoder::new());
    execute(&config, ctx).await
}

/// GETs `url` and returns the body as text. Invalid UTF-8 is replaced.
pub async fn get_text(ctx: &Context, url: impl Into<String>) -> Result<String> {
    let body = get_bytes(ctx, url).await?;
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Like [`get_text`], starting from `config`.
pub async fn get_text_with(
    ctx: &Context,
    url: impl Into<String>,
    config: CallConfig<Bytes>,
) -> Result<String> {
    let body = get_bytes_with(ctx, url, config).await?;
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// GETs `url` and parses the body as JSON.
///
/// # Examples
///
/// ```no_run
/// use fetchline::{shortcuts, Context};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Release {
///     tag_name: String,
/// }
///
/// # async fn example() -> Result<(), fetchline::Error> {
/// let release: Release =
///     shortcuts::get_json(&Context::background(), "https://example.test/latest").await?;
/// println!("{}", release.tag_name);
/// # Ok(())
/// # }
/// ```
pub async fn get_json<T>(ctx: &Context, url: impl Into<String>) -> Result<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let url = url.into();
    let config = CallConfig::new(url.clone(), JsonDecoder::<T>::new());
    get_json_with(ctx, url, config).await
}

/// Like [`get_json`], starting from `config`.
pub async fn get_json_with<T>(
    ctx: &Context,
    url: impl Into<String>,
    config: CallConfig<T>,
) -> Result<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let config = config
        .with_target(url)
        .with_json_decoder()
        .with_mutator(mutator::content_type(JSON_CONTENT_TYPE));
    execute(&config, ctx).await
}

/// GETs `url` and parses the body as YAML.
pub async fn get_yaml<T>(ctx: &Context, url: impl Into<String>) -> Result<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let url = url.into();
    let config = CallConfig::new(url.clone(), YamlDecoder::<T>::new());
    get_yaml_with(ctx, url, config).await
}

/// Like [`get_yaml`], starting from `config`.
pub async fn get_yaml_with<T>(
    ctx: &Context,
    url: impl Into<String>,
    config: CallConfig<T>,
) -> Result<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let config = config.with_target(url).with_yaml_decoder();
    execute(&config, ctx).await
}

/// Serializes `payload` as JSON, POSTs it to `url` and parses the JSON reply.
///
/// Fails with [`Error::Serialization`] before any request if `payload`
/// cannot be encoded.
pub async fn post_json<P, T>(ctx: &Context, url: impl Into<String>, payload: &P) -> Result<T>
where
    P: Serialize + ?Sized,
    T: DeserializeOwned + Send + 'static,
{
    let url = url.into();
    let config = CallConfig::new(url.clone(), JsonDecoder::<T>::new());
    post_json_with(ctx, url, payload, config).await
}

/// Like [`post_json`], starting from `config`.
///
/// A method already set on `config` other than `GET` is kept.
pub async fn post_json_with<P, T>(
    ctx: &Context,
    url: impl Into<String>,
    payload: &P,
    config: CallConfig<T>,
) -> Result<T>
where
    P: Serialize + ?Sized,
    T: DeserializeOwned + Send + 'static,
{
    let body = serde_json::to_vec(payload).map_err(|e| {
        Error::Serialization(format!("{}, type = {}", e, std::any::type_name::<P>()))
    })?;

    let config = config
        .with_target(url)
        .with_json_decoder()
        .with_mutator(mutator::content_type(JSON_CONTENT_TYPE))
        .with_body(body);
    execute(&config, ctx).await
}
