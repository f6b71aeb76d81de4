use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{eval::EvaluationDetails, EvaluationContext, EvaluationReason};

/// A record of a single flag evaluation, handed to [`EvaluationLogger`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationEvent {
    pub flag_key: String,
    pub user_id: Option<String>,
    pub enabled: bool,
    pub reason: EvaluationReason,
    pub timestamp: String,
    pub meta_data: HashMap<String, String>,
}

impl EvaluationEvent {
    pub(crate) fn new(context: &EvaluationContext, details: &EvaluationDetails) -> Self {
        EvaluationEvent {
            flag_key: details.flag_key.clone(),
            user_id: context.user_id.clone(),
            enabled: details.enabled,
            reason: details.reason,
            timestamp: Utc::now().to_rfc3339(),
            meta_data: HashMap::from([
                ("sdkName".to_owned(), env!("CARGO_PKG_NAME").to_owned()),
                (
                    "sdkVersion".to_owned(),
                    env!("CARGO_PKG_VERSION").to_owned(),
                ),
            ]),
        }
    }
}

/// Receives an [`EvaluationEvent`] for every evaluation made by the client. Use it to forward
/// exposures to your analytics pipeline.
pub trait EvaluationLogger {
    fn log_evaluation(&self, event: EvaluationEvent);
}

pub(crate) struct NoopEvaluationLogger;
impl EvaluationLogger for NoopEvaluationLogger {
    fn log_evaluation(&self, _event: EvaluationEvent) {}
}

impl<T: Fn(EvaluationEvent)> EvaluationLogger for T {
    fn log_evaluation(&self, event: EvaluationEvent) {
        self(event);
    }
}
