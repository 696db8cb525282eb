//! Prompt construction and answer post-processing.

use edubot_types::protocol::OpenAIMessage;
use edubot_types::{DispatchConfig, Emotion, EmotionReading};

const BASE_PROMPT: &str = "You are EduBot 🎓, a patient, warm and encouraging AI teacher. \
You have at most 1000 tokens per reply, so always finish your last sentence; for long topics give \
a structured summary and offer to continue in the next message.\n\
\n\
How you teach:\n\
✨ stay positive and supportive\n\
🎯 explain things simply, with concrete examples and analogies\n\
🎊 celebrate every bit of progress\n\
📚 keep facts accurate\n\
🤗 notice how the student feels and respond to it\n\
\n\
Use friendly language, fitting emoji and plenty of encouragement.";

fn subject_line(subject: &str) -> String {
    let line = match subject.trim().to_lowercase().as_str() {
        "matematika" | "math" | "mathematics" => {
            "🔢 You specialise in mathematics and make hard ideas feel simple."
        },
        "fisika" | "physics" => "⚛️ You are a physics expert who makes experiments exciting.",
        "kimia" | "chemistry" => {
            "🧪 You are a chemistry teacher who explains reactions safely and clearly."
        },
        "biologi" | "biology" => "🌿 You are a biologist who loves explaining living things.",
        "sejarah" | "history" => "📚 You are a storyteller who brings history to life.",
        "bahasa" | "language" => "📝 You are a creative language teacher.",
        "geografi" | "geography" => "🌍 You are an explorer who helps students understand our planet.",
        _ => return format!("📖 You are a passionate teacher of {}.", subject.trim()),
    };
    line.to_string()
}

fn emotion_guidance(emotion: &Emotion) -> &'static str {
    match emotion {
        Emotion::Happy => {
            "🎉 The student is happy and motivated. Praise their effort sincerely, share a fun fact \
             or study tip, and keep the tone cheerful."
        },
        Emotion::Confused => {
            "🤔 The student is confused. Acknowledge it kindly, explain step by step from the basics \
             with simple analogies, and check whether it is clear now."
        },
        Emotion::Frustrated => {
            "😤 The student is frustrated. Acknowledge the feeling, break the problem into small \
             steps, and remind them that learning is a process."
        },
        Emotion::Angry => {
            "😠 The student is upset. Stay calm, acknowledge the feeling without judgment, avoid \
             provocative wording and focus on a practical solution."
        },
        Emotion::Neutral | Emotion::Other(_) => {
            "🤖 The student is calm and ready to learn. Be clear, informative and get to the point \
             with practical examples, while staying warm."
        },
    }
}

/// System instruction for one request.
pub fn system_prompt(emotion: &Emotion, subject: Option<&str>) -> String {
    let mut prompt = BASE_PROMPT.to_string();
    if let Some(subject) = subject.filter(|s| !s.trim().is_empty()) {
        prompt.push_str("\n\n");
        prompt.push_str(&subject_line(subject));
    }
    prompt.push_str("\n\n");
    prompt.push_str(emotion_guidance(emotion));
    prompt
}

/// System instruction, then at most `max_context` prior turns, then the new
/// user turn.
pub fn build_messages(
    message: &str,
    emotion: &Emotion,
    subject: Option<&str>,
    context: &[OpenAIMessage],
    max_context: usize,
) -> Vec<OpenAIMessage> {
    let start = context.len().saturating_sub(max_context);
    let mut messages = Vec::with_capacity(context.len() - start + 2);
    messages.push(OpenAIMessage::system(system_prompt(emotion, subject)));
    messages.extend_from_slice(&context[start..]);
    messages.push(OpenAIMessage::user(message));
    messages
}

fn emotion_emoji(emotion: &Emotion) -> &'static str {
    match emotion {
        Emotion::Happy => "😊",
        Emotion::Confused => "🤔",
        Emotion::Frustrated => "😤",
        Emotion::Angry => "😠",
        Emotion::Neutral | Emotion::Other(_) => "🤖",
    }
}

fn learning_tip(emotion: &Emotion) -> Option<&'static str> {
    match emotion {
        Emotion::Happy => Some("Use this good energy to pick up a new topic!"),
        Emotion::Confused => {
            Some("Being confused is fine, it means your brain is working hard!")
        },
        Emotion::Frustrated => Some("Take a short break, then try a different approach."),
        Emotion::Angry => Some("Take a deep breath, we will sort this out together."),
        Emotion::Neutral | Emotion::Other(_) => None,
    }
}

/// Appends the emotion acknowledgement and learning tip to a live answer.
pub fn enhance(answer: &str, reading: &EmotionReading, config: &DispatchConfig) -> String {
    let mut enhanced = answer.to_string();
    if reading.confidence > config.acknowledge_confidence {
        enhanced.push_str(&format!(
            "\n\n{} *I can tell you're feeling {} right now!*",
            emotion_emoji(&reading.emotion),
            reading.emotion.label().to_lowercase()
        ));
    }
    if reading.confidence > config.tip_confidence {
        if let Some(tip) = learning_tip(&reading.emotion) {
            enhanced.push_str("\n\n💡 **Tip**: ");
            enhanced.push_str(tip);
        }
    }
    enhanced
}
