use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    rules::{Operator, Rule},
    Error, Result, Value,
};

/// Metadata key holding the value returned by [`Client::get_variation`](crate::Client::get_variation).
pub const VARIATION_METADATA_KEY: &str = "variation";

/// A feature flag definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFlag {
    pub key: String,
    pub enabled: bool,
    /// Share of subjects, in percent, that pass the rollout check. Must be in `0..=100`.
    pub percentage: u8,
    /// All rules must pass for the flag to be enabled.
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl FeatureFlag {
    /// Create an enabled flag with a full rollout, no rules and no metadata.
    pub fn new(key: impl Into<String>) -> Self {
        FeatureFlag {
            key: key.into(),
            enabled: true,
            percentage: 100,
            rules: Vec::new(),
            metadata: HashMap::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn percentage(mut self, percentage: u8) -> Self {
        self.percentage = percentage;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The variation value carried in metadata, if any.
    pub fn variation(&self) -> Option<&Value> {
        self.metadata.get(VARIATION_METADATA_KEY)
    }

    fn validate(&self) -> Result<()> {
        if self.percentage > 100 {
            return Err(Error::InvalidPercentage {
                key: self.key.clone(),
                percentage: self.percentage,
            });
        }
        Ok(())
    }
}

/// An immutable, validated set of flags keyed by flag key.
///
/// Stores never mutate a `FlagSet`; a refresh builds a new one and swaps it in whole.
#[derive(Debug, Default)]
pub struct FlagSet {
    flags: HashMap<String, Arc<FeatureFlag>>,
}

impl FlagSet {
    /// Validate `flags` and build a set out of them.
    ///
    /// Fails if any percentage is above 100 or a key appears twice.
    pub fn new(flags: Vec<FeatureFlag>) -> Result<Self> {
        let mut map = HashMap::with_capacity(flags.len());
        for flag in flags {
            flag.validate()?;
            match map.entry(flag.key.clone()) {
                Entry::Occupied(_) => return Err(Error::DuplicateFlagKey(flag.key)),
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(flag));
                }
            }
        }
        Ok(FlagSet { flags: map })
    }

    pub fn empty() -> Self {
        FlagSet::default()
    }

    /// The built-in flag set used when a client starts without explicit flags.
    pub fn defaults() -> Self {
        // Built-in definitions are statically valid.
        FlagSet::new(default_flags()).unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&Arc<FeatureFlag>> {
        self.flags.get(key)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<FeatureFlag>> {
        self.flags.values()
    }
}

/// Built-in development flags.
pub fn default_flags() -> Vec<FeatureFlag> {
    vec![
        FeatureFlag::new("new_user_onboarding"),
        FeatureFlag::new("advanced_analytics")
            .enabled(false)
            .percentage(0),
        FeatureFlag::new("beta_features").percentage(10).rule(Rule::new(
            "user_type",
            Operator::Equals,
            "beta_tester",
        )),
    ]
}

/// Flag definitions on the wire: either a bare list or wrapped in a `flags` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FlagDocument {
    List(Vec<FeatureFlag>),
    Wrapped { flags: Vec<FeatureFlag> },
}

/// Parse a JSON document of flag definitions. The result is not validated yet; see
/// [`FlagSet::new`].
pub fn parse_flags(json: &[u8]) -> Result<Vec<FeatureFlag>> {
    let document: FlagDocument = serde_json::from_slice(json)?;
    Ok(match document {
        FlagDocument::List(flags) | FlagDocument::Wrapped { flags } => flags,
    })
}
