//! # Fetchline - a composable HTTP call pipeline
//!
//! Fetchline describes one HTTP call as a [`CallConfig`]: a target, a method,
//! a body, an ordered chain of request [mutators](mutator::Mutator) and a
//! status-gated [`Decoder`]. The engine runs it with a bounded number of
//! immediate retries and returns the decoded value or the last error.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fetchline::{execute, mutator, CallConfig, Context, JsonDecoder};
//! use serde::Deserialize;
//! use std::time::Duration;
//!
//! #[derive(Deserialize)]
//! struct Data {
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fetchline::Error> {
//!     let config = CallConfig::new("https://example.test/data", JsonDecoder::<Data>::new())
//!         .with_attempts(3)
//!         .with_mutator(mutator::header("Accept", "application/json"))
//!         .with_mutator(mutator::proxy("http://127.0.0.1:3128"));
//!
//!     let ctx = Context::with_timeout(Duration::from_secs(30));
//!     let data = execute(&config, &ctx).await?;
//!     println!("Name: {}", data.name);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Builder configuration** - Chainable `with_*` methods; nothing is validated until the call runs
//! - **Mutator pipeline** - Headers, user agent, proxy, timeouts and TLS settings applied before every attempt
//! - **Status-gated decoding** - Bytes, text, JSON and YAML decoders with an accepted status set (200 and 404 by default)
//! - **Diagnostic errors** - Parse failures keep the parser error, the target type name and the raw body
//! - **Bounded retries** - Transport and decode failures are retried immediately; mutator and construction failures are not
//! - **Cancellation** - Every wait on the network races a [`Context`] token and deadline
//! - **Structured logging** - Attempts and failures are reported through `tracing`
//!
//! ## Defaults
//!
//! New configurations send a desktop browser user agent and **accept invalid
//! TLS certificates**. Replace the pipeline with
//! [`CallConfig::with_mutators`] to opt out:
//!
//! ```no_run
//! use fetchline::{mutator, pipeline, CallConfig, TextDecoder};
//!
//! let strict: CallConfig<String> = CallConfig::new("https://example.test", TextDecoder::new())
//!     .with_mutators(pipeline![mutator::user_agent("my-app/1.0")]);
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use fetchline::{shortcuts, Context, Error};
//!
//! # async fn example() {
//! match shortcuts::get_json::<serde_json::Value>(&Context::background(), "https://example.test/x").await {
//!     Ok(value) => println!("Success: {value}"),
//!     Err(Error::Deserialization { type_name, raw_body, source, .. }) => {
//!         eprintln!("Failed to decode {type_name}: {source}");
//!         eprintln!("  Raw body: {raw_body}");
//!     }
//!     Err(Error::Status { status, .. }) => eprintln!("Rejected status {status}"),
//!     Err(e) => eprintln!("Other error: {e}"),
//! }
//! # }
//! ```

mod config;
mod context;
pub mod decoder;
mod engine;
mod error;
pub mod mutator;
pub mod shortcuts;

pub use config::{CallConfig, DEFAULT_ATTEMPTS, DEFAULT_METHOD};
pub use context::Context;
pub use decoder::{BytesDecoder, Decoder, JsonDecoder, TextDecoder, YamlDecoder};
pub use engine::execute;
pub use error::{BoxError, Error, Format, Result};
pub use mutator::Mutator;
