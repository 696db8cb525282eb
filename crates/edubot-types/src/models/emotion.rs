//! Emotion labels produced by the classifier.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Emotional tone of a student message.
///
/// Parsed leniently from classifier labels. Anything unrecognised is kept
/// verbatim in [`Emotion::Other`] and rendered with the neutral tone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Emotion {
    Happy,
    Neutral,
    Confused,
    Frustrated,
    Angry,
    Other(String),
}

impl Emotion {
    /// Every recognised emotion, in display order.
    pub const KNOWN: [Emotion; 5] =
        [Self::Happy, Self::Neutral, Self::Confused, Self::Frustrated, Self::Angry];

    /// Parse a classifier label (Indonesian labels and English synonyms, case-insensitive).
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_lowercase().as_str() {
            "senang" | "happy" | "joy" => Self::Happy,
            "netral" | "neutral" => Self::Neutral,
            "bingung" | "confused" | "confusion" => Self::Confused,
            "frustrasi" | "frustrated" | "frustration" => Self::Frustrated,
            "marah" | "angry" | "anger" => Self::Angry,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Canonical classifier label.
    pub fn label(&self) -> &str {
        match self {
            Self::Happy => "Senang",
            Self::Neutral => "Netral",
            Self::Confused => "Bingung",
            Self::Frustrated => "Frustrasi",
            Self::Angry => "Marah",
            Self::Other(label) => label,
        }
    }

    /// Whether this is one of the recognised labels.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Emotion {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<&str> for Emotion {
    fn from(label: &str) -> Self {
        Self::from_label(label)
    }
}

impl From<Emotion> for String {
    fn from(emotion: Emotion) -> Self {
        emotion.label().to_string()
    }
}

/// Output of one classifier call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionReading {
    pub emotion: Emotion,
    /// Confidence of the top label, in `[0, 1]`
    pub confidence: f64,
    /// Score per label
    #[serde(default)]
    pub distribution: BTreeMap<String, f64>,
}

impl EmotionReading {
    pub const UNKNOWN_LABEL: &'static str = "Unknown";

    pub fn new(emotion: Emotion, confidence: f64, distribution: BTreeMap<String, f64>) -> Self {
        Self { emotion, confidence: confidence.clamp(0.0, 1.0), distribution }
    }

    /// Sentinel returned when classification fails.
    pub fn unknown() -> Self {
        Self {
            emotion: Emotion::Other(Self::UNKNOWN_LABEL.to_string()),
            confidence: 0.0,
            distribution: BTreeMap::new(),
        }
    }

    /// Labels sorted by descending score, truncated to `n`.
    pub fn top(&self, n: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> =
            self.distribution.iter().map(|(label, score)| (label.as_str(), *score)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    /// Compact `Label(0.912), Other(0.050)` rendering for logs.
    pub fn summary(&self, n: usize) -> String {
        let mut parts = vec![format!("{}({:.3})", self.emotion, self.confidence)];
        parts.extend(
            self.top(n)
                .into_iter()
                .filter(|(label, _)| *label != self.emotion.label())
                .map(|(label, score)| format!("{label}({score:.3})")),
        );
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_is_case_insensitive() {
        assert_eq!(Emotion::from_label("senang"), Emotion::Happy);
        assert_eq!(Emotion::from_label(" MARAH "), Emotion::Angry);
        assert_eq!(Emotion::from_label("confused"), Emotion::Confused);
    }

    #[test]
    fn test_unrecognised_label_is_preserved() {
        let emotion = Emotion::from_label("Takut");
        assert_eq!(emotion, Emotion::Other("Takut".to_string()));
        assert_eq!(emotion.label(), "Takut");
        assert!(!emotion.is_known());
    }

    #[test]
    fn test_serde_uses_label() {
        let json = serde_json::to_string(&Emotion::Frustrated).unwrap_or_default();
        assert_eq!(json, "\"Frustrasi\"");
        let parsed: Emotion = serde_json::from_str("\"Bingung\"").unwrap_or(Emotion::Neutral);
        assert_eq!(parsed, Emotion::Confused);
    }

    #[test]
    fn test_unknown_sentinel() {
        let reading = EmotionReading::unknown();
        assert_eq!(reading.emotion.label(), "Unknown");
        assert_eq!(reading.confidence, 0.0);
        assert!(reading.distribution.is_empty());
    }

    #[test]
    fn test_top_orders_by_score() {
        let mut distribution = BTreeMap::new();
        distribution.insert("Senang".to_string(), 0.1);
        distribution.insert("Bingung".to_string(), 0.7);
        distribution.insert("Marah".to_string(), 0.2);
        let reading = EmotionReading::new(Emotion::Confused, 0.7, distribution);

        let top = reading.top(2);
        assert_eq!(top, vec![("Bingung", 0.7), ("Marah", 0.2)]);
        assert_eq!(reading.summary(2), "Bingung(0.700), Marah(0.200)");
    }
}
