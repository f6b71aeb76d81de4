use std::sync::Arc;

use crate::{
    eval::EvaluationDetails,
    evaluation_logger::EvaluationEvent,
    flag_source::{refresh_store, FlagSource},
    flag_store::FlagStore,
    flags::{FeatureFlag, FlagSet},
    poller::{PollerConfig, PollerThread},
    ClientConfig, EvaluationContext, EvaluationReason, Result, Value,
};

/// A feature flag client.
///
/// In order to create a client instance, first create [`ClientConfig`].
///
/// # Examples
/// ```
/// # use flagset::{Client, ClientConfig, EvaluationContext};
/// let client = Client::new(ClientConfig::new()).unwrap();
/// assert!(client.is_enabled("new_user_onboarding", &EvaluationContext::new("user-1")));
/// ```
pub struct Client<'a> {
    flag_store: Arc<FlagStore>,
    config: ClientConfig<'a>,
}

impl<'a> Client<'a> {
    /// Create a new `Client` using the specified configuration.
    ///
    /// Fails if the configured initial flags are invalid.
    pub fn new(mut config: ClientConfig<'a>) -> Result<Self> {
        let initial_flags = match config.initial_flags.take() {
            Some(flags) => FlagSet::new(flags)?,
            None => FlagSet::defaults(),
        };

        Ok(Client {
            flag_store: Arc::new(FlagStore::new(initial_flags)),
            config,
        })
    }

    /// Returns `true` if the flag is enabled for the given context.
    ///
    /// Unknown flags are disabled.
    pub fn is_enabled(&self, flag_key: &str, context: &EvaluationContext) -> bool {
        self.evaluate(flag_key, context).enabled
    }

    /// Evaluate a flag, returning the reason behind the outcome.
    pub fn evaluate(&self, flag_key: &str, context: &EvaluationContext) -> EvaluationDetails {
        let flags = self.flag_store.snapshot();
        self.evaluate_in(&flags, flag_key, context)
    }

    /// Returns the flag's `variation` metadata if the flag is enabled for the given context, and
    /// `default_value` otherwise.
    pub fn get_variation(
        &self,
        flag_key: &str,
        context: &EvaluationContext,
        default_value: Value,
    ) -> Value {
        // Evaluation and variation lookup must see the same flag set.
        let flags = self.flag_store.snapshot();

        if !self.evaluate_in(&flags, flag_key, context).enabled {
            return default_value;
        }

        flags
            .get(flag_key)
            .and_then(|flag| flag.variation())
            .cloned()
            .unwrap_or(default_value)
    }

    fn evaluate_in(
        &self,
        flags: &FlagSet,
        flag_key: &str,
        context: &EvaluationContext,
    ) -> EvaluationDetails {
        let reason = flags.eval_flag(flag_key, context, &*self.config.bucketer);

        if reason == EvaluationReason::FlagNotFound {
            log::debug!(target: "flagset", flag_key; "flag not found");
        } else {
            log::trace!(target: "flagset",
                        flag_key,
                        user_id = context.user_id(),
                        reason:serde = reason;
                        "evaluated a flag");
        }

        let details = EvaluationDetails::new(flag_key, reason);
        self.config
            .evaluation_logger
            .log_evaluation(EvaluationEvent::new(context, &details));
        details
    }

    /// Replace all flags. The new flags are validated first; on error the current flags stay
    /// active.
    pub fn refresh(&self, flags: Vec<FeatureFlag>) -> Result<()> {
        let flags = FlagSet::new(flags).inspect_err(|err| {
            log::warn!(target: "flagset", "rejected feature flag refresh: {:?}", err);
        })?;
        let count = flags.len();
        self.flag_store.replace_all(flags);
        log::info!(target: "flagset", flag_count = count; "refreshed feature flags");
        Ok(())
    }

    /// Fetch flags from `source` and replace all flags with them.
    pub fn refresh_from(&self, source: &dyn FlagSource) -> Result<()> {
        refresh_store(&self.flag_store, source)
            .inspect_err(|err| {
                log::warn!(target: "flagset", "error while refreshing feature flags: {:?}", err);
            })
            .map(|_| ())
    }

    /// Get a single flag definition.
    pub fn flag(&self, flag_key: &str) -> Option<Arc<FeatureFlag>> {
        self.flag_store.get(flag_key)
    }

    /// All currently active flag definitions, in no particular order.
    pub fn all_flags(&self) -> Vec<Arc<FeatureFlag>> {
        self.flag_store.snapshot().iter().cloned().collect()
    }

    /// Drop all flags. Every evaluation afterwards is disabled until the next refresh.
    pub fn close(&self) {
        self.flag_store.clear();
        log::debug!(target: "flagset", "feature flag client closed");
    }

    /// Start a poller thread that periodically refreshes flags from `source`.
    pub fn start_poller_thread(
        &self,
        source: impl FlagSource + 'static,
        config: PollerConfig,
    ) -> Result<PollerThread> {
        PollerThread::start(self.flag_store.clone(), Box::new(source), config)
    }
}
