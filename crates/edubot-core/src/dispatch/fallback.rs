//! Canned replies served when no live answer could be obtained.
//!
//! Pure and total: every `(emotion, kind)` pair maps to a fixed non-empty
//! string, with unrecognised emotions using the neutral tone.

use edubot_types::{Emotion, FallbackKind};

#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackResponder;

/// Tone bucket; `Other` emotions collapse to `Neutral`.
#[derive(Clone, Copy)]
enum Tone {
    Happy,
    Neutral,
    Confused,
    Frustrated,
    Angry,
}

impl From<&Emotion> for Tone {
    fn from(emotion: &Emotion) -> Self {
        match emotion {
            Emotion::Happy => Self::Happy,
            Emotion::Confused => Self::Confused,
            Emotion::Frustrated => Self::Frustrated,
            Emotion::Angry => Self::Angry,
            Emotion::Neutral | Emotion::Other(_) => Self::Neutral,
        }
    }
}

impl FallbackResponder {
    pub fn respond(&self, emotion: &Emotion, kind: FallbackKind) -> &'static str {
        let tone = Tone::from(emotion);
        match kind {
            FallbackKind::Generic => generic(tone),
            FallbackKind::RateLimited => rate_limited(tone),
            FallbackKind::Timeout => timeout(tone),
            FallbackKind::Connection => connection(tone),
        }
    }

    /// Like [`respond`](Self::respond), plus a subject hint for generic
    /// replies when the message names a known subject.
    pub fn respond_for_message(
        &self,
        emotion: &Emotion,
        kind: FallbackKind,
        message: &str,
    ) -> String {
        let base = self.respond(emotion, kind);
        match (kind, subject_hint(message)) {
            (FallbackKind::Generic, Some(hint)) => format!("{base}\n\n{hint}"),
            _ => base.to_string(),
        }
    }
}

fn subject_hint(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));
    if mentions(&["matematika", "math", "hitung"]) {
        Some("🔢 Oh, this is about maths? I love maths!")
    } else if mentions(&["fisika", "physics"]) {
        Some("⚛️ Physics! We can talk about experiments and cool formulas.")
    } else if mentions(&["sejarah", "history"]) {
        Some("📚 History! I have plenty of great stories from the past.")
    } else {
        None
    }
}

fn generic(tone: Tone) -> &'static str {
    match tone {
        Tone::Happy => "🎉 Love your enthusiasm! I'm ready to help you learn even more. What would you like to ask? 😊",
        Tone::Neutral => "📚 Hi! I'm EduBot, here to make learning fun. What shall we study today? 🤖",
        Tone::Confused => "🤔 I can see this feels confusing, and that's okay! Let's take it step by step. Can you tell me which part is unclear? 💡",
        Tone::Frustrated => "😤 Frustration is no fun, but every expert was once a beginner! Let's try an easier approach together. You can do this! 💪",
        Tone::Angry => "😠 I understand you're upset. Let's take a breath and solve this together. I'm here to help. 🤝",
    }
}

fn rate_limited(tone: Tone) -> &'static str {
    match tone {
        Tone::Happy => "🎉 Sorry, the server is busy because lots of students are as keen as you! Please try again in a moment. 😊",
        Tone::Neutral => "🤖 The server is busy helping many students right now. Please try again shortly. Thanks for your patience! 📚",
        Tone::Confused => "🤔 The server is crowded with questions right now. Don't worry, ask again in a moment and I'll help clear things up! 💡",
        Tone::Frustrated => "😤 I know this is annoying, the server is very busy. Try again in a moment and we'll get there! 💪",
        Tone::Angry => "😠 Sorry if this is irritating. The server is busy, but I'm still here for you. Please bear with me for a moment. 🤝",
    }
}

fn timeout(tone: Tone) -> &'static str {
    match tone {
        Tone::Happy => "🎉 Your energy is great, but the connection is slow right now. Ask me again and I'll answer! 😊",
        Tone::Neutral => "🤖 The connection is slow at the moment. Please repeat your question and I'll help! 📚",
        Tone::Confused => "🤔 Something slowed things down on my side. No worries, try again and I'll still help! 💡",
        Tone::Frustrated => "😤 I get that a slow connection is frustrating. Don't give up, try again and we'll solve it together! 💪",
        Tone::Angry => "😠 Sorry the connection let you down. I'm still here, please try again in a moment. 🤝",
    }
}

fn connection(tone: Tone) -> &'static str {
    match tone {
        Tone::Happy => "🎉 Love your motivation! There's a brief connection problem, please try again! 😊",
        Tone::Neutral => "🤖 There was a connection problem. Please try again in a moment. 📚",
        Tone::Confused => "🤔 A technical hiccup cut the connection. No need to worry, just try again! 💡",
        Tone::Frustrated => "😤 I know a connection problem makes things worse. Let's not give up, try again! 💪",
        Tone::Angry => "😠 Really sorry about this technical problem. I'm still here to help, please try again. 🤝",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_over_emotions_and_kinds() {
        let responder = FallbackResponder;
        let mut emotions: Vec<Emotion> = Emotion::KNOWN.to_vec();
        emotions.push(Emotion::Other("Takut".into()));
        emotions.push(Emotion::Other(String::new()));

        for emotion in &emotions {
            for kind in FallbackKind::ALL {
                let first = responder.respond(emotion, kind);
                assert!(!first.is_empty());
                assert_eq!(first, responder.respond(emotion, kind));
            }
        }
    }

    #[test]
    fn test_unknown_emotion_uses_neutral_tone() {
        let responder = FallbackResponder;
        for kind in FallbackKind::ALL {
            assert_eq!(
                responder.respond(&Emotion::Other("Unknown".into()), kind),
                responder.respond(&Emotion::Neutral, kind)
            );
        }
    }

    #[test]
    fn test_kinds_differ() {
        let responder = FallbackResponder;
        let texts: std::collections::HashSet<&str> =
            FallbackKind::ALL.iter().map(|k| responder.respond(&Emotion::Confused, *k)).collect();
        assert_eq!(texts.len(), 4);
    }

    #[test]
    fn test_subject_hint_only_on_generic() {
        let responder = FallbackResponder;
        let generic =
            responder.respond_for_message(&Emotion::Neutral, FallbackKind::Generic, "Soal FISIKA");
        assert!(generic.ends_with("cool formulas."));

        let timeout =
            responder.respond_for_message(&Emotion::Neutral, FallbackKind::Timeout, "Soal fisika");
        assert_eq!(timeout, responder.respond(&Emotion::Neutral, FallbackKind::Timeout));
    }
}
