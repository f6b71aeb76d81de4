use crate::{
    bucketer::{Bucketer, RollingHashBucketer},
    evaluation_logger::NoopEvaluationLogger,
    flags::FeatureFlag,
    Client, EvaluationLogger, Result,
};

/// Configuration for [`Client`].
pub struct ClientConfig<'a> {
    /// `None` means the built-in flag set.
    pub(crate) initial_flags: Option<Vec<FeatureFlag>>,
    pub(crate) bucketer: Box<dyn Bucketer + Send + Sync + 'a>,
    pub(crate) evaluation_logger: Box<dyn EvaluationLogger + Send + Sync + 'a>,
}

impl<'a> Default for ClientConfig<'a> {
    fn default() -> Self {
        ClientConfig {
            initial_flags: None,
            bucketer: Box::new(RollingHashBucketer),
            evaluation_logger: Box::new(NoopEvaluationLogger),
        }
    }
}

impl<'a> ClientConfig<'a> {
    /// Create a default configuration: built-in flags, rolling-hash bucketing and no evaluation
    /// logging.
    ///
    /// ```
    /// # use flagset::ClientConfig;
    /// ClientConfig::new();
    /// ```
    pub fn new() -> Self {
        ClientConfig::default()
    }

    /// Start with no flags at all instead of the built-in set.
    pub fn without_default_flags(self) -> Self {
        self.initial_flags(Vec::new())
    }

    /// Start with the given flags instead of the built-in set. They are validated by
    /// [`ClientConfig::to_client`].
    pub fn initial_flags(mut self, flags: Vec<FeatureFlag>) -> Self {
        self.initial_flags = Some(flags);
        self
    }

    /// Set evaluation logger to pass evaluation events to your data warehouse.
    ///
    /// ```
    /// # use flagset::ClientConfig;
    /// let config = ClientConfig::new().evaluation_logger(|event: flagset::EvaluationEvent| {
    ///   println!("{:?}", event);
    /// });
    /// ```
    pub fn evaluation_logger(
        mut self,
        evaluation_logger: impl EvaluationLogger + Send + Sync + 'a,
    ) -> Self {
        self.evaluation_logger = Box::new(evaluation_logger);
        self
    }

    /// Override the percentage bucketer. Clients should use the default setting in most cases:
    /// changing it reshuffles every partial rollout.
    pub fn bucketer(mut self, bucketer: impl Bucketer + Send + Sync + 'a) -> Self {
        self.bucketer = Box::new(bucketer);
        self
    }

    /// Create a new [`Client`] using the specified configuration.
    ///
    /// ```
    /// # use flagset::{ClientConfig, Client};
    /// let client: Client = ClientConfig::new().to_client().unwrap();
    /// ```
    pub fn to_client(self) -> Result<Client<'a>> {
        Client::new(self)
    }
}
