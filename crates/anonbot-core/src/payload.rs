//! Relayable content.

/// A platform-native media reference plus the sender's optional caption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Media {
    pub file_id: String,
    pub caption: Option<String>,
}

impl Media {
    pub fn new(file_id: impl Into<String>, caption: Option<String>) -> Self {
        Self {
            file_id: file_id.into(),
            caption,
        }
    }
}

/// Content unit forwarded between parties.
///
/// Anything the platform can carry but the relay cannot forward lands in
/// `Unsupported` with the platform's kind name, and is always rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayPayload {
    Text(String),
    Photo(Media),
    Video(Media),
    Document(Media),
    Voice(Media),
    Audio(Media),
    Unsupported(String),
}

const TEXT_HEADER: &str = "📩 Anonymous message:";

/// Telegram limits, in UTF-16 units.
const MAX_TEXT_CHARS: usize = 4096;
const MAX_CAPTION_CHARS: usize = 1024;

impl RelayPayload {
    pub fn kind(&self) -> &str {
        match self {
            RelayPayload::Text(_) => "text",
            RelayPayload::Photo(_) => "photo",
            RelayPayload::Video(_) => "video",
            RelayPayload::Document(_) => "document",
            RelayPayload::Voice(_) => "voice",
            RelayPayload::Audio(_) => "audio",
            RelayPayload::Unsupported(kind) => kind,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, RelayPayload::Unsupported(_))
    }

    /// Text body, if this is a plain text message.
    pub fn text(&self) -> Option<&str> {
        match self {
            RelayPayload::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Build what the recipient actually sees: same content, annotated as
    /// anonymous. A caption written by the sender is kept below the annotation.
    pub fn anonymized(&self) -> RelayPayload {
        match self {
            RelayPayload::Text(t) => {
                RelayPayload::Text(under_header(TEXT_HEADER, t, MAX_TEXT_CHARS))
            }
            RelayPayload::Photo(m) => RelayPayload::Photo(annotate(m, "📷 Anonymous photo")),
            RelayPayload::Video(m) => RelayPayload::Video(annotate(m, "🎥 Anonymous video")),
            RelayPayload::Document(m) => {
                RelayPayload::Document(annotate(m, "📄 Anonymous document"))
            }
            RelayPayload::Voice(m) => {
                RelayPayload::Voice(annotate(m, "🎙️ Anonymous voice message"))
            }
            RelayPayload::Audio(m) => RelayPayload::Audio(annotate(m, "🎵 Anonymous audio")),
            RelayPayload::Unsupported(kind) => RelayPayload::Unsupported(kind.clone()),
        }
    }
}

fn annotate(media: &Media, label: &str) -> Media {
    let caption = match media.caption.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => under_header(label, c, MAX_CAPTION_CHARS),
        _ => label.to_string(),
    };
    Media::new(media.file_id.clone(), Some(caption))
}

/// `header`, a blank line, then `body`, cut so the whole fits in `max`
/// UTF-16 units (the way Telegram measures text).
fn under_header(header: &str, body: &str, max: usize) -> String {
    let budget = max.saturating_sub(utf16_len(header) + 2);
    if utf16_len(body) <= budget {
        return format!("{header}\n\n{body}");
    }

    let mut cut = String::new();
    let mut used = 0;
    for c in body.chars() {
        used += c.len_utf16();
        if used >= budget {
            break;
        }
        cut.push(c);
    }
    format!("{header}\n\n{cut}…")
}

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}
