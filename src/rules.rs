use serde::{Deserialize, Serialize};

use crate::{EvaluationContext, Value};

/// A single attribute comparison attached to a flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub attribute: String,
    pub operator: Operator,
    /// Scalar for `eq`/`ne`, a [`Value::Set`] for `in`/`not_in`.
    pub value: Value,
}

impl Rule {
    pub fn new(attribute: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Rule {
            attribute: attribute.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn eval(&self, context: &EvaluationContext) -> bool {
        let attribute = context.get(&self.attribute);
        self.operator.eval(attribute.as_deref(), &self.value)
    }
}

/// Comparison applied by a [`Rule`]. Serialized as `eq`, `ne`, `in` and `not_in`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    /// Any operator this crate does not know about, kept verbatim so it survives
    /// re-serialization. Never passes.
    Unknown(String),
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "eq" => Self::Equals,
            "ne" => Self::NotEquals,
            "in" => Self::In,
            "not_in" => Self::NotIn,
            _ => Self::Unknown(value),
        }
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        match value {
            Operator::Unknown(operator) => operator,
            known => known.as_str().to_owned(),
        }
    }
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "eq",
            Self::NotEquals => "ne",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Unknown(operator) => operator,
        }
    }

    /// Apply the operator to a resolved attribute (`None` if the context lacks it) and the rule
    /// operand.
    pub fn eval(&self, attribute: Option<&Value>, rule_value: &Value) -> bool {
        match self {
            Self::Equals => attribute == Some(rule_value),
            Self::NotEquals => attribute != Some(rule_value),
            Self::In => is_member(attribute, rule_value),
            Self::NotIn => !is_member(attribute, rule_value),
            Self::Unknown(_) => false,
        }
    }
}

/// An absent attribute is a member of nothing. A non-set operand has no members.
fn is_member(attribute: Option<&Value>, set: &Value) -> bool {
    match (attribute, set) {
        (Some(attribute), Value::Set(values)) => values.contains(attribute),
        _ => false,
    }
}
