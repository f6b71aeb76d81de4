use std::{borrow::Cow, collections::HashMap};

use serde::{Deserialize, Serialize};

use crate::Value;

/// Facts about the subject of an evaluation.
///
/// Built fresh for every evaluation call and never stored by the client.
///
/// ```
/// # use flagset::EvaluationContext;
/// let context = EvaluationContext::new("user-42")
///     .with_email("user@example.com")
///     .with_attribute("user_type", "beta_tester");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    /// Subject identity. Required for partial rollouts.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Additional attributes available to rules.
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

impl EvaluationContext {
    /// Rule attribute name resolving to [`EvaluationContext::user_id`].
    pub const USER_ID_ATTRIBUTE: &'static str = "user_id";
    /// Rule attribute name resolving to [`EvaluationContext::email`].
    pub const EMAIL_ATTRIBUTE: &'static str = "email";

    /// Create a context for the given subject.
    pub fn new(user_id: impl Into<String>) -> Self {
        EvaluationContext {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    /// Create a context without subject identity. Such a context never passes a partial rollout.
    pub fn anonymous() -> Self {
        EvaluationContext::default()
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Resolve a rule attribute. Reserved names map to dedicated fields, anything else is looked
    /// up in [`EvaluationContext::attributes`]. Returns `None` for missing attributes.
    pub fn get(&self, attribute: &str) -> Option<Cow<'_, Value>> {
        match attribute {
            Self::USER_ID_ATTRIBUTE => self.user_id.as_deref().map(|s| Cow::Owned(s.into())),
            Self::EMAIL_ATTRIBUTE => self.email.as_deref().map(|s| Cow::Owned(s.into())),
            _ => self.attributes.get(attribute).map(Cow::Borrowed),
        }
    }
}
