use serde::{Deserialize, Serialize};

use crate::{
    bucketer::Bucketer,
    flags::{FeatureFlag, FlagSet},
    EvaluationContext,
};

/// Why a flag evaluated the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationReason {
    /// No flag with the requested key exists.
    FlagNotFound,
    /// The flag is switched off.
    Disabled,
    /// The rule at `rule_index` did not pass.
    RuleMismatch { rule_index: usize },
    /// The flag is partially rolled out and the context has no subject id.
    MissingSubject,
    /// The subject's bucket is at or above the rollout percentage.
    OutsideRollout { bucket: u8 },
    /// The subject's bucket is below the rollout percentage.
    InRollout { bucket: u8 },
    /// The flag is rolled out to everyone who passes its rules.
    FullRollout,
}

impl EvaluationReason {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::InRollout { .. } | Self::FullRollout)
    }
}

/// Result of evaluating a single flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDetails {
    pub flag_key: String,
    pub enabled: bool,
    pub reason: EvaluationReason,
}

impl EvaluationDetails {
    pub(crate) fn new(flag_key: &str, reason: EvaluationReason) -> Self {
        EvaluationDetails {
            flag_key: flag_key.to_owned(),
            enabled: reason.is_enabled(),
            reason,
        }
    }
}

impl FlagSet {
    pub fn eval_flag(
        &self,
        flag_key: &str,
        context: &EvaluationContext,
        bucketer: &dyn Bucketer,
    ) -> EvaluationReason {
        match self.get(flag_key) {
            Some(flag) => flag.eval(context, bucketer),
            None => EvaluationReason::FlagNotFound,
        }
    }
}

impl FeatureFlag {
    pub fn eval(&self, context: &EvaluationContext, bucketer: &dyn Bucketer) -> EvaluationReason {
        if !self.enabled {
            return EvaluationReason::Disabled;
        }

        if let Some(rule_index) = self.rules.iter().position(|rule| !rule.eval(context)) {
            return EvaluationReason::RuleMismatch { rule_index };
        }

        if self.percentage >= 100 {
            return EvaluationReason::FullRollout;
        }

        let Some(user_id) = context.user_id() else {
            return EvaluationReason::MissingSubject;
        };

        let bucket = bucketer.bucket(&self.key, user_id);
        if bucket < self.percentage {
            EvaluationReason::InRollout { bucket }
        } else {
            EvaluationReason::OutsideRollout { bucket }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::{
        bucketer::{FixedBucketer, RollingHashBucketer},
        flags::{default_flags, FeatureFlag, FlagSet},
        rules::{Operator, Rule},
        EvaluationContext, Value,
    };

    use super::EvaluationReason;

    fn beta_tester(user_id: &str) -> EvaluationContext {
        EvaluationContext::new(user_id).with_attribute("user_type", "beta_tester")
    }

    #[test]
    fn unknown_flag() {
        let set = FlagSet::defaults();
        assert_eq!(
            set.eval_flag("missing", &beta_tester("u1"), &RollingHashBucketer),
            EvaluationReason::FlagNotFound
        );
    }

    #[test]
    fn disabled_flag_ignores_rollout() {
        let flag = FeatureFlag::new("off").enabled(false);
        assert_eq!(
            flag.eval(&beta_tester("u1"), &RollingHashBucketer),
            EvaluationReason::Disabled
        );
    }

    #[test]
    fn reports_first_failing_rule() {
        let flag = FeatureFlag::new("rules")
            .rule(Rule::new("user_type", Operator::Equals, "beta_tester"))
            .rule(Rule::new("plan", Operator::Equals, "pro"));
        assert_eq!(
            flag.eval(&beta_tester("u1"), &RollingHashBucketer),
            EvaluationReason::RuleMismatch { rule_index: 1 }
        );
        assert_eq!(
            flag.eval(&EvaluationContext::new("u1"), &RollingHashBucketer),
            EvaluationReason::RuleMismatch { rule_index: 0 }
        );
    }

    #[test]
    fn empty_rule_list_passes() {
        let flag = FeatureFlag::new("no_rules");
        assert!(flag.rules.is_empty());
        assert_eq!(
            flag.eval(&EvaluationContext::new("u1"), &RollingHashBucketer),
            EvaluationReason::FullRollout
        );
    }

    #[test]
    fn all_rules_must_pass() {
        let flag = FeatureFlag::new("targeted")
            .rule(Rule::new("user_type", Operator::Equals, "beta_tester"))
            .rule(Rule::new(
                "country",
                Operator::NotIn,
                Value::Set(vec!["XX".into(), "YY".into()]),
            ));

        let context = beta_tester("u1").with_attribute("country", "ES");
        assert_eq!(
            flag.eval(&context, &RollingHashBucketer),
            EvaluationReason::FullRollout
        );

        let context = beta_tester("u1").with_attribute("country", "XX");
        assert_eq!(
            flag.eval(&context, &RollingHashBucketer),
            EvaluationReason::RuleMismatch { rule_index: 1 }
        );

        let context = EvaluationContext::new("u1").with_attribute("country", "ES");
        assert_eq!(
            flag.eval(&context, &RollingHashBucketer),
            EvaluationReason::RuleMismatch { rule_index: 0 }
        );
    }

    #[test]
    fn full_rollout_does_not_need_subject() {
        let flag = FeatureFlag::new("everyone");
        assert_eq!(
            flag.eval(&EvaluationContext::anonymous(), &RollingHashBucketer),
            EvaluationReason::FullRollout
        );
    }

    #[test]
    fn partial_rollout_without_subject() {
        let flag = FeatureFlag::new("half").percentage(50);
        assert_eq!(
            flag.eval(&EvaluationContext::anonymous(), &RollingHashBucketer),
            EvaluationReason::MissingSubject
        );
    }

    #[test]
    fn partial_rollout_uses_bucketer() {
        let bucketer = FixedBucketer(HashMap::from([
            ("low".to_owned(), 9),
            ("edge".to_owned(), 10),
        ]));
        let flag = FeatureFlag::new("ten").percentage(10);
        assert_eq!(
            flag.eval(&EvaluationContext::new("low"), &bucketer),
            EvaluationReason::InRollout { bucket: 9 }
        );
        assert_eq!(
            flag.eval(&EvaluationContext::new("edge"), &bucketer),
            EvaluationReason::OutsideRollout { bucket: 10 }
        );
    }

    #[test]
    fn beta_features_example() {
        let set = FlagSet::new(default_flags()).unwrap();

        // bucket("beta_features", "u1") == 56
        assert_eq!(
            set.eval_flag("beta_features", &beta_tester("u1"), &RollingHashBucketer),
            EvaluationReason::OutsideRollout { bucket: 56 }
        );
        // bucket("beta_features", "u39") == 9
        assert_eq!(
            set.eval_flag("beta_features", &beta_tester("u39"), &RollingHashBucketer),
            EvaluationReason::InRollout { bucket: 9 }
        );
        // rules are checked before the rollout
        assert_eq!(
            set.eval_flag(
                "beta_features",
                &EvaluationContext::new("u39").with_attribute("user_type", "regular"),
                &RollingHashBucketer
            ),
            EvaluationReason::RuleMismatch { rule_index: 0 }
        );
    }

    #[test]
    fn reason_serializes_with_kind_tag() {
        let json = serde_json::to_value(EvaluationReason::InRollout { bucket: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "IN_ROLLOUT", "bucket": 3}));
    }
}
