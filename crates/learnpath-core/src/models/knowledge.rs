//! Knowledge-map entries shown as bubbles on a learning node.

use serde::{Deserialize, Deserializer, Serialize};

/// Accuracy at or above which a point counts as mastered.
const MASTERED_ACCURACY: u8 = 80;

/// Accuracy below which a point counts as weak.
const WEAK_ACCURACY: u8 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Easy,
    Medium,
    Hard,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Easy => "easy",
            Level::Medium => "medium",
            Level::Hard => "hard",
        }
    }
}

/// A single knowledge point.
///
/// `module` and `order` are only present on points that came from the
/// remote knowledge map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct KnowledgePoint {
    pub id: String,
    pub name: String,
    pub level: Level,
    #[serde(default)]
    pub description: String,
    /// Quiz accuracy in percent. Fractional values are rounded and values
    /// outside 0..=100 are clamped.
    #[serde(
        default,
        deserialize_with = "deserialize_accuracy",
        skip_serializing_if = "Option::is_none"
    )]
    pub accuracy: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

fn deserialize_accuracy<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let accuracy = Option::<f64>::deserialize(deserializer)?;
    Ok(accuracy
        .filter(|a| a.is_finite())
        .map(|a| a.round().clamp(0.0, 100.0) as u8))
}

impl KnowledgePoint {
    pub fn new(id: &str, name: &str, level: Level, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            level,
            description: description.to_string(),
            accuracy: None,
            module: None,
            order: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy: u8) -> Self {
        self.accuracy = Some(accuracy.min(100));
        self
    }

    pub fn mastery(&self) -> MasteryStatus {
        self.accuracy
            .map(MasteryStatus::from_accuracy)
            .unwrap_or(MasteryStatus::Untouched)
    }
}

/// How well a knowledge point is known, derived from quiz accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum MasteryStatus {
    Untouched,
    Weak,
    Fair,
    Mastered,
}

impl MasteryStatus {
    pub fn from_accuracy(accuracy: u8) -> Self {
        match accuracy {
            0 => MasteryStatus::Untouched,
            a if a < WEAK_ACCURACY => MasteryStatus::Weak,
            a if a < MASTERED_ACCURACY => MasteryStatus::Fair,
            _ => MasteryStatus::Mastered,
        }
    }

    /// Bubble colour used by the knowledge-graph view.
    pub fn color(&self) -> &'static str {
        match self {
            MasteryStatus::Untouched => "gray",
            MasteryStatus::Weak => "light-blue",
            MasteryStatus::Fair => "blue",
            MasteryStatus::Mastered => "green",
        }
    }
}
