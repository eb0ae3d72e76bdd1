//! Assistant reply parsing and escalation rules

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Phrases that mark a reply as "the assistant could not help"
const UNKNOWN_TRIGGERS: &[&str] = &[
    "doesn't exist",
    "does not exist",
    "isn't available",
    "not available",
    "can't find",
    "i don\u{2019}t see",
    "i don't see",
    "not sure",
    "i'm not sure",
    "no specific",
    "not a feature",
];

/// Unknown replies after which the support address is offered
pub const ESCALATION_THRESHOLD: u32 = 2;

/// Trailing JSON object leaked into a plain-text reply
static TRAILING_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}\s*$").expect("static regex"));

/// Feature the user asked for, as summarized by the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Structured reply the model is asked to produce
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SupportReply {
    pub reply: String,
    pub missing_feature: bool,
    pub feature_request: FeatureRequest,
}

/// Wire shape with every field optional, so `null`s do not reject the reply
#[derive(Deserialize)]
struct WireReply {
    reply: Option<String>,
    missing_feature: Option<bool>,
    feature_request: Option<FeatureRequest>,
}

impl SupportReply {
    /// Parse model output; anything that is not the expected JSON object is
    /// taken as the reply text itself. Leaked JSON is stripped from the reply.
    pub fn parse(content: &str) -> Self {
        let content = content.trim();
        let mut parsed = match serde_json::from_str::<WireReply>(content) {
            Ok(wire) => Self {
                reply: wire.reply.unwrap_or_default(),
                missing_feature: wire.missing_feature.unwrap_or(false),
                feature_request: wire.feature_request.unwrap_or_default(),
            },
            Err(_) => Self {
                reply: content.to_string(),
                ..Self::default()
            },
        };

        parsed.reply = strip_json_leak(&parsed.reply);
        parsed
    }

    /// True when the model flagged a missing feature or hedged in its reply
    pub fn is_unknown(&self) -> bool {
        if self.missing_feature {
            return true;
        }
        let reply = self.reply.to_lowercase();
        UNKNOWN_TRIGGERS.iter().any(|t| reply.contains(t))
    }
}

/// Remove a trailing `{...}` blob and surrounding whitespace
pub fn strip_json_leak(text: &str) -> String {
    TRAILING_JSON.replace(text, "").trim().to_string()
}

/// Append the support address offer to `reply`
pub fn with_escalation(reply: &str, support_email: &str) -> String {
    format!(
        "{}\n\nIf you still need help, email support at {} and let me know what the issue is ^_^.",
        reply.trim_end(),
        support_email
    )
}
