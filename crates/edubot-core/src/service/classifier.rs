//! Emotion classification seam.

use std::collections::BTreeMap;

use async_trait::async_trait;
use edubot_types::{Emotion, EmotionReading};
use tracing::debug;

/// Labels a student message with an emotion.
///
/// Implementations never fail: on any internal error they return
/// [`EmotionReading::unknown`].
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> EmotionReading;

    /// Identifier written to the interaction log.
    fn name(&self) -> &str;
}

const NEUTRAL_PRIOR: f64 = 1.0;
const OTHER_PRIOR: f64 = 0.25;

/// Keyword-scoring classifier for Indonesian and English student messages.
///
/// Each matched cue adds one point to its emotion on top of a small prior
/// (neutral gets the largest), and scores are normalised into a distribution.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconClassifier;

fn cues(emotion: &Emotion) -> &'static [&'static str] {
    match emotion {
        Emotion::Happy => &[
            "senang", "seneng", "asik", "asyik", "yay", "hore", "mantap", "keren", "berhasil",
            "terima kasih", "makasih", "happy", "great", "awesome", "thanks", "love", "😊", "🎉",
        ],
        Emotion::Confused => &[
            "bingung", "gak ngerti", "nggak ngerti", "tidak mengerti", "kurang paham",
            "gimana", "bagaimana", "maksudnya", "confused", "don't understand", "dont understand",
            "how do", "what does", "🤔",
        ],
        Emotion::Frustrated => &[
            "frustasi", "frustrasi", "capek", "lelah", "susah", "sulit", "nyerah", "menyerah",
            "gagal terus", "stuck", "frustrated", "give up", "too hard", "tired", "😩",
        ],
        Emotion::Angry => &[
            "marah", "kesal", "kesel", "benci", "sebel", "bodoh", "jelek", "angry", "hate",
            "stupid", "annoying", "useless", "😠", "😡",
        ],
        Emotion::Neutral | Emotion::Other(_) => &[],
    }
}

impl LexiconClassifier {
    pub fn score(&self, text: &str) -> EmotionReading {
        let lower = text.trim().to_lowercase();
        if lower.is_empty() {
            return EmotionReading::unknown();
        }

        let mut raw: Vec<(Emotion, f64)> = Emotion::KNOWN
            .iter()
            .map(|emotion| {
                let prior =
                    if *emotion == Emotion::Neutral { NEUTRAL_PRIOR } else { OTHER_PRIOR };
                let hits = cues(emotion).iter().filter(|cue| lower.contains(*cue)).count();
                (emotion.clone(), prior + hits as f64)
            })
            .collect();

        let total: f64 = raw.iter().map(|(_, score)| score).sum();
        for (_, score) in &mut raw {
            *score /= total;
        }

        // Ties keep the earlier emotion in `KNOWN` order.
        let (top, confidence) = raw.iter().fold((Emotion::Neutral, f64::MIN), |best, (e, s)| {
            if *s > best.1 {
                (e.clone(), *s)
            } else {
                best
            }
        });

        let distribution: BTreeMap<String, f64> =
            raw.into_iter().map(|(emotion, score)| (emotion.label().to_string(), score)).collect();
        EmotionReading::new(top, confidence, distribution)
    }
}

#[async_trait]
impl EmotionClassifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> EmotionReading {
        let reading = self.score(text);
        debug!("🧠 CLASSIFIER: {}", reading.summary(3));
        reading
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}
