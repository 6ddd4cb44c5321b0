//! Equipment recommendations returned by the backend for a lead.

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier the backend assigned to a created lead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LeadId {
    /// Accepts numeric or string ids.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) if !s.is_empty() => Ok(Self(s)),
            serde_json::Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected a string or numeric lead id, got {other}"
            ))),
        }
    }
}

/// One recommended product line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecommendation {
    pub brand: String,
    /// One or more model names.
    #[serde(alias = "model", deserialize_with = "one_or_many")]
    pub models: Vec<String>,
    /// Opaque display string; ranges arrive as `{min, max}` and are rendered
    /// as `"min - max"`.
    #[serde(default, deserialize_with = "display_price")]
    pub price: String,
}

/// Read-only result shown on the last screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    #[serde(default)]
    pub autoclave_recommendations: Vec<EquipmentRecommendation>,
    #[serde(default)]
    pub washer_recommendations: Vec<EquipmentRecommendation>,
}

impl RecommendationResult {
    pub fn is_empty(&self) -> bool {
        self.autoclave_recommendations.is_empty() && self.washer_recommendations.is_empty()
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

fn display_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(price_text(&value))
}

fn price_text(value: &serde_json::Value) -> String {
    use serde_json::Value;

    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Object(range) => match (range.get("min"), range.get("max")) {
            (Some(min), Some(max)) => format!("{} - {}", price_text(min), price_text(max)),
            (Some(only), None) | (None, Some(only)) => price_text(only),
            (None, None) => String::new(),
        },
        Value::Array(parts) => parts.iter().map(price_text).collect::<Vec<_>>().join(" - "),
        Value::Null | Value::Bool(_) => String::new(),
    }
}
