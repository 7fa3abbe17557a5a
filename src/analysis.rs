use rand::Rng;
use regex::Regex;
use serde::Serialize;

/// Requests mentioning any of these are refused outright
const HARMFUL_KEYWORDS: [&str; 7] = [
    "theft",
    "steal",
    "hack",
    "fraud",
    "harm",
    "exploit",
    "manipulate",
];

/// Markup characters treated as an injection attempt
const SUSPICIOUS_PATTERN: &str = r"[<>{}]";

/// Messages counted toward the engagement score
const ENGAGEMENT_WINDOW: usize = 5;

/// Outcome of screening one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screening {
    Accepted,
    Rejected(&'static str),
}

impl Screening {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Screening::Rejected(_))
    }
}

/// One engagement reading over the recent message window
#[derive(Debug, Clone, Serialize)]
pub struct EngagementReading {
    pub dynamics: &'static str,
    pub engagement: &'static str,
    pub engagement_score: f64,
    pub message_count: usize,
}

struct MessageEntry {
    length: usize,
    response_time: f64,
}

/// Tracks conversation dynamics and screens inputs
pub struct InteractionAnalyzer {
    context: Vec<MessageEntry>,
    suspicious: Regex,
}

impl Default for InteractionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionAnalyzer {
    pub fn new() -> Self {
        Self {
            context: Vec::new(),
            suspicious: Regex::new(SUSPICIOUS_PATTERN).expect("static pattern compiles"),
        }
    }

    /// Record a message and score engagement over the recent window.
    /// Message length above 20 and sub-second response times both count
    /// toward the score; fewer than two messages is not enough signal.
    pub fn analyze(&mut self, message: &str, response_time: Option<f64>) -> EngagementReading {
        let response_time =
            response_time.unwrap_or_else(|| rand::thread_rng().gen_range(0.1..1.0));
        self.context.push(MessageEntry {
            length: message.len(),
            response_time,
        });

        if self.context.len() < 2 {
            return EngagementReading {
                dynamics: "insufficient_data",
                engagement: "neutral",
                engagement_score: 0.0,
                message_count: self.context.len(),
            };
        }

        let start = self.context.len().saturating_sub(ENGAGEMENT_WINDOW);
        let recent = &self.context[start..];

        let mut score = 0.0;
        for entry in recent {
            if entry.length > 20 {
                score += 0.3;
            }
            if entry.response_time < 1.0 {
                score += 0.2;
            }
        }

        let engagement = if score > 0.7 {
            "high"
        } else if score > 0.4 {
            "medium"
        } else {
            "low"
        };

        EngagementReading {
            dynamics: "normal",
            engagement,
            engagement_score: score / recent.len() as f64,
            message_count: recent.len(),
        }
    }

    /// Screen an input for harmful keywords or markup characters
    pub fn screen(&self, input: &str) -> Screening {
        let lowered = input.to_lowercase();
        if HARMFUL_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            return Screening::Rejected("unethical request");
        }
        if self.suspicious.is_match(input) {
            return Screening::Rejected("invalid input");
        }
        Screening::Accepted
    }

    /// Strip the markup characters the screen rejects
    pub fn sanitize(&self, input: &str) -> String {
        self.suspicious.replace_all(input, "").into_owned()
    }
}
