//! In-process feature flag evaluation.
//!
//! # Overview
//!
//! The crate revolves around a [`Client`] that decides whether a [`FeatureFlag`] is enabled for an
//! [`EvaluationContext`], i.e. for a subject with an id, an optional email and arbitrary
//! key-value attributes. A flag is enabled for a context when:
//!
//! 1. the flag exists and is switched on,
//! 2. every [`Rule`] attached to it passes, and
//! 3. the subject falls inside the flag's rollout percentage.
//!
//! Rollout membership is decided by a [`Bucketer`] that maps the flag key and subject id to a
//! stable bucket in `0..100`, so a subject keeps its assignment across calls, restarts and
//! replicas without any shared state.
//!
//! Flags live in an in-memory [`FlagStore`] that is replaced wholesale on refresh. A refresh can
//! come from code ([`Client::refresh`]), from a [`FlagSource`] ([`Client::refresh_from`]) or from a
//! background [`PollerThread`].
//!
//! # Error Handling
//!
//! Evaluation never fails: unknown flags and malformed rules simply evaluate to disabled. Errors,
//! represented by the [`Error`] enum, are only returned while loading or refreshing flag
//! definitions, and a failed refresh always leaves the current flags in place.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging messages under
//! the `flagset` target. Consider integrating a `log`-compatible logger implementation for better
//! visibility into refreshes and evaluations. Use an [`EvaluationLogger`] to receive structured
//! evaluation events.
//!
//! # Examples
//!
//! ```
//! # use flagset::{ClientConfig, EvaluationContext, Value};
//! let client = ClientConfig::new().to_client().unwrap();
//!
//! let context = EvaluationContext::new("user-42").with_attribute("user_type", "beta_tester");
//! if client.is_enabled("new_user_onboarding", &context) {
//!     // ...
//! }
//!
//! let theme = client.get_variation("dark_theme", &context, Value::from("light"));
//! assert_eq!(theme, Value::from("light"));
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

mod bucketer;
mod client;
mod config;
mod context;
mod error;
mod eval;
mod evaluation_logger;
mod flag_source;
mod flag_store;
mod flags;
mod poller;
mod rules;
mod value;

pub use bucketer::{Bucketer, RollingHashBucketer};
pub use client::Client;
pub use config::ClientConfig;
pub use context::EvaluationContext;
pub use error::{Error, Result};
pub use eval::{EvaluationDetails, EvaluationReason};
pub use evaluation_logger::{EvaluationEvent, EvaluationLogger};
pub use flag_source::{FileFlagSource, FlagSource, HttpFlagSource, StaticFlagSource};
pub use flag_store::FlagStore;
pub use flags::{default_flags, parse_flags, FeatureFlag, FlagSet, VARIATION_METADATA_KEY};
pub use poller::{PollerConfig, PollerThread};
pub use rules::{Operator, Rule};
pub use value::Value;
