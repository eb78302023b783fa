//! The execution engine: runs a [`CallConfig`] with its attempt budget.

use crate::mutator::Transport;
use crate::{CallConfig, Context, Error, Result};
use http::Method;
use url::Url;

/// How a failed attempt affects the rest of the call.
enum Failure {
    /// Ends the call now, whatever budget is left.
    Fatal(Error),
    /// Recorded; the next attempt starts immediately if budget remains.
    Retryable(Error),
}

impl Failure {
    fn classify(error: Error) -> Self {
        if error.is_retryable() {
            Failure::Retryable(error)
        } else {
            Failure::Fatal(error)
        }
    }
}

/// Errors raised while reqwest assembles the request never reach the network
/// and cannot succeed on a later attempt.
fn send_error(error: reqwest::Error) -> Error {
    if error.is_builder() {
        Error::Construction(format!("Invalid request: {}", error))
    } else {
        Error::Transport(error)
    }
}

/// Executes `config`, returning the first successfully decoded value.
///
/// Each attempt builds a new client and request, runs the mutator pipeline,
/// sends, and decodes:
///
/// - a mutator error, a malformed method or target, or a cancelled `ctx` ends
///   the call at once;
/// - a transport or decode error is retried immediately while attempts
///   remain;
/// - when the budget is spent, the error from the last attempt is returned
///   and earlier ones are dropped.
///
/// # Examples
///
/// ```no_run
/// use fetchline::{execute, CallConfig, Context, TextDecoder};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), fetchline::Error> {
/// let config = CallConfig::new("https://example.test/robots.txt", TextDecoder::new())
///     .with_attempts(2);
///
/// let body = execute(&config, &Context::with_timeout(Duration::from_secs(10))).await?;
/// println!("{body}");
/// # Ok(())
/// # }
/// ```
pub async fn execute<T>(config: &CallConfig<T>, ctx: &Context) -> Result<T> {
    let (method, url) = parse_target(config)?;
    let attempts = config.attempts().max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        if let Some(err) = ctx.err() {
            tracing::debug!(attempt = attempt, error = %err, "Context done before attempt");
            return Err(err);
        }

        match run_attempt(config, ctx, &method, &url, attempt).await {
            Ok(value) => return Ok(value),
            Err(Failure::Fatal(e)) => {
                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    method = %method,
                    url = %url,
                    "Call aborted"
                );
                return Err(e);
            }
            Err(Failure::Retryable(e)) => {
                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    attempts = attempts,
                    method = %method,
                    url = %url,
                    "Attempt failed"
                );

                if attempt >= attempts {
                    return Err(e);
                }
            }
        }
    }
}

/// Validates the method and target once; both are fixed for the whole call.
fn parse_target<T>(config: &CallConfig<T>) -> Result<(Method, Url)> {
    let method = Method::from_bytes(config.method().as_bytes()).map_err(|e| {
        Error::Construction(format!("Invalid method {:?}: {}", config.method(), e))
    })?;

    let url = Url::parse(config.target()).map_err(|e| {
        Error::Construction(format!("Invalid target {:?}: {}", config.target(), e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Construction(format!(
            "Unsupported scheme {:?} in target {}",
            url.scheme(),
            url
        )));
    }

    Ok((method, url))
}

/// One attempt: fresh transport and request, mutators, send, decode.
///
/// The response is moved into the decoder, so its body is released when
/// decoding finishes or the attempt is cancelled.
async fn run_attempt<T>(
    config: &CallConfig<T>,
    ctx: &Context,
    method: &Method,
    url: &Url,
    attempt: usize,
) -> std::result::Result<T, Failure> {
    let mut transport = Transport::default();
    let mut request = reqwest::Request::new(method.clone(), url.clone());
    if !config.body().is_empty() {
        *request.body_mut() = Some(config.body().clone().into());
    }

    for mutator in config.mutators() {
        mutator
            .apply(&mut transport, &mut request)
            .map_err(Failure::Fatal)?;
    }

    let client = transport.build().map_err(Failure::Fatal)?;

    tracing::debug!(
        method = %method,
        url = %url,
        attempt = attempt,
        "Executing HTTP request"
    );

    let response = ctx
        .run(async { client.execute(request).await.map_err(send_error) })
        .await
        .map_err(Failure::classify)?;

    tracing::debug!(
        status = response.status().as_u16(),
        attempt = attempt,
        "Received HTTP response"
    );

    ctx.run(config.decoder().decode(response))
        .await
        .map_err(Failure::classify)
}
