//! User-facing notices (Telegram HTML).

use crate::{domain::UserId, errors::DeliveryError};

/// Longest error description we echo back to a user.
const MAX_REASON_CHARS: usize = 200;

/// How a recipient was picked; shown in the confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Forwarded,
    Numeric,
    Handle(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Greeting,
    TargetSet { recipient: UserId, via: Resolution },
    NotFound,
    InvalidId(String),
    HiddenForward,
    NoTarget,
    Unsupported { kind: String },
    Sent,
    DeliveryFailed(DeliveryError),
    ReplyPrompt,
    ReplyUnknown,
    ReplySuperseded,
}

impl Notice {
    pub fn render(&self) -> String {
        match self {
            Notice::Greeting => "👋 Hi! Send me a <b>recipient ID</b>, <b>forward a message</b> from them \
                 or write their <b>@username</b>, and I will pass your message on anonymously."
                .to_string(),
            Notice::TargetSet { recipient, via } => {
                let head = match via {
                    Resolution::Forwarded => "✅ Recipient found".to_string(),
                    Resolution::Numeric => "✅ Recipient ID set".to_string(),
                    Resolution::Handle(h) => format!("✅ ID for @{} found", escape_html(h)),
                };
                format!("{head}: <code>{recipient}</code>\n\nNow send a text or media.")
            }
            Notice::NotFound => {
                "❌ User not found, or they do not accept messages.".to_string()
            }
            Notice::InvalidId(raw) => format!(
                "❌ <code>{}</code> is not a valid user ID.",
                escape_html(&truncate_chars(raw, 32))
            ),
            Notice::HiddenForward => "❌ The author of this forwarded message hides their account. \
                 Send their ID or @username instead."
                .to_string(),
            Notice::NoTarget => {
                "⚠️ First send an ID, an @username or a forwarded message.".to_string()
            }
            Notice::Unsupported { kind } => format!(
                "❌ This format is not supported ({}).",
                escape_html(kind)
            ),
            Notice::Sent => "✅ Message sent anonymously!".to_string(),
            Notice::DeliveryFailed(err) => format!(
                "⚠️ Failed to send: {}\nThe recipient may have closed private messages or never started the bot.",
                escape_html(&truncate_chars(&err.to_string(), MAX_REASON_CHARS))
            ),
            Notice::ReplyPrompt => "✍️ Write your anonymous reply and I will pass it on.".to_string(),
            Notice::ReplyUnknown => "⚠️ Cannot determine the original sender.".to_string(),
            Notice::ReplySuperseded => {
                "⚠️ Someone wrote to you after this message; only the latest sender can be answered."
                    .to_string()
            }
        }
    }
}

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    format!("{}...", s.chars().take(max).collect::<String>())
}
