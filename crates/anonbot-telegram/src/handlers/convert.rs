use teloxide::types::{CallbackQuery, MediaKind, Message, MessageKind};

use anonbot_core::{
    domain::{ChatId, UserId},
    messaging::types::{ActionActivation, ForwardOrigin, IncomingMessage},
    payload::{Media, RelayPayload},
};

/// Convert a Telegram message into a core message.
///
/// Returns `None` for updates without an author or without content (service
/// messages such as pins or member changes).
pub fn incoming_message(msg: &Message) -> Option<IncomingMessage> {
    let user = msg.from()?;
    let payload = payload_of(msg)?;

    Some(IncomingMessage {
        chat_id: ChatId(msg.chat.id.0),
        user_id: UserId(user.id.0 as i64),
        forward: forward_origin(msg),
        payload,
    })
}

pub fn action_activation(q: &CallbackQuery) -> Option<ActionActivation> {
    let chat = q.message.as_ref()?.chat.id;
    Some(ActionActivation {
        chat_id: ChatId(chat.0),
        user_id: UserId(q.from.id.0 as i64),
        action_id: q.id.clone(),
        data: q.data.clone().unwrap_or_default(),
    })
}

fn forward_origin(msg: &Message) -> Option<ForwardOrigin> {
    if let Some(user) = msg.forward_from_user() {
        return Some(ForwardOrigin::User(UserId(user.id.0 as i64)));
    }
    // Forwarded from a hidden account, a channel or an anonymous admin.
    msg.forward_date().map(|_| ForwardOrigin::Hidden)
}

fn payload_of(msg: &Message) -> Option<RelayPayload> {
    let MessageKind::Common(common) = &msg.kind else {
        return None;
    };

    let payload = match &common.media_kind {
        MediaKind::Text(t) => RelayPayload::Text(t.text.clone()),
        // Telegram lists photo sizes smallest first.
        MediaKind::Photo(p) => {
            let best = p.photo.last()?;
            RelayPayload::Photo(Media::new(best.file.id.to_string(), p.caption.clone()))
        }
        MediaKind::Video(v) => {
            RelayPayload::Video(Media::new(v.video.file.id.to_string(), v.caption.clone()))
        }
        MediaKind::Document(d) => RelayPayload::Document(Media::new(
            d.document.file.id.to_string(),
            d.caption.clone(),
        )),
        MediaKind::Voice(v) => {
            RelayPayload::Voice(Media::new(v.voice.file.id.to_string(), v.caption.clone()))
        }
        MediaKind::Audio(a) => {
            RelayPayload::Audio(Media::new(a.audio.file.id.to_string(), a.caption.clone()))
        }
        other => RelayPayload::Unsupported(unsupported_kind(other).to_string()),
    };
    Some(payload)
}

fn unsupported_kind(kind: &MediaKind) -> &'static str {
    match kind {
        MediaKind::Animation(_) => "animation",
        MediaKind::Contact(_) => "contact",
        MediaKind::Game(_) => "game",
        MediaKind::Location(_) => "location",
        MediaKind::Poll(_) => "poll",
        MediaKind::Sticker(_) => "sticker",
        MediaKind::Venue(_) => "venue",
        MediaKind::VideoNote(_) => "video note",
        _ => "unknown media",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(extra: serde_json::Value) -> Message {
        let mut base = json!({
            "message_id": 10,
            "date": 1700000000,
            "chat": { "id": 111, "type": "private", "first_name": "Sender" },
            "from": { "id": 111, "is_bot": false, "first_name": "Sender", "username": "sender" }
        });
        let (Some(obj), Some(more)) = (base.as_object_mut(), extra.as_object()) else {
            panic!("objects expected");
        };
        for (k, v) in more {
            obj.insert(k.clone(), v.clone());
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn text_message() {
        let m = incoming_message(&message(json!({ "text": "hi" }))).unwrap();
        assert_eq!(m.user_id, UserId(111));
        assert_eq!(m.chat_id, ChatId(111));
        assert_eq!(m.forward, None);
        assert_eq!(m.payload, RelayPayload::Text("hi".to_string()));
    }

    #[test]
    fn photo_uses_largest_size() {
        let m = incoming_message(&message(json!({
            "photo": [
                { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 90, "file_size": 10 },
                { "file_id": "large", "file_unique_id": "l", "width": 900, "height": 900, "file_size": 1000 }
            ],
            "caption": "look"
        })))
        .unwrap();
        assert_eq!(
            m.payload,
            RelayPayload::Photo(Media::new("large", Some("look".to_string())))
        );
    }

    #[test]
    fn forwarded_from_visible_user() {
        let m = incoming_message(&message(json!({
            "text": "original words",
            "forward_from": { "id": 4242, "is_bot": false, "first_name": "Origin" },
            "forward_date": 1690000000
        })))
        .unwrap();
        assert_eq!(m.forward, Some(ForwardOrigin::User(UserId(4242))));
    }

    #[test]
    fn forwarded_from_hidden_user() {
        let m = incoming_message(&message(json!({
            "text": "original words",
            "forward_sender_name": "Someone",
            "forward_date": 1690000000
        })))
        .unwrap();
        assert_eq!(m.forward, Some(ForwardOrigin::Hidden));
    }

    #[test]
    fn forwarded_from_channel_is_hidden() {
        let m = incoming_message(&message(json!({
            "text": "channel post",
            "forward_from_chat": { "id": -1001234567890i64, "type": "channel", "title": "News" },
            "forward_from_message_id": 5,
            "forward_date": 1690000000
        })))
        .unwrap();
        assert_eq!(m.forward, Some(ForwardOrigin::Hidden));
    }

    #[test]
    fn video_with_caption() {
        let m = incoming_message(&message(json!({
            "video": {
                "file_id": "vid", "file_unique_id": "v", "width": 640, "height": 360,
                "duration": 12, "file_size": 2048
            },
            "caption": "clip"
        })))
        .unwrap();
        assert_eq!(
            m.payload,
            RelayPayload::Video(Media::new("vid", Some("clip".to_string())))
        );
    }

    #[test]
    fn document_without_caption() {
        let m = incoming_message(&message(json!({
            "document": {
                "file_id": "doc", "file_unique_id": "d", "file_name": "notes.pdf", "file_size": 512
            }
        })))
        .unwrap();
        assert_eq!(m.payload, RelayPayload::Document(Media::new("doc", None)));
    }

    #[test]
    fn voice_message() {
        let m = incoming_message(&message(json!({
            "voice": { "file_id": "ogg", "file_unique_id": "o", "duration": 3, "file_size": 100 }
        })))
        .unwrap();
        assert_eq!(m.payload, RelayPayload::Voice(Media::new("ogg", None)));
    }

    #[test]
    fn audio_with_caption() {
        let m = incoming_message(&message(json!({
            "audio": { "file_id": "mp3", "file_unique_id": "a", "duration": 180, "file_size": 4096 },
            "caption": "song"
        })))
        .unwrap();
        assert_eq!(
            m.payload,
            RelayPayload::Audio(Media::new("mp3", Some("song".to_string())))
        );
    }

    #[test]
    fn location_is_unsupported() {
        let m = incoming_message(&message(json!({
            "location": { "latitude": 1.5, "longitude": 2.5 }
        })))
        .unwrap();
        assert_eq!(m.payload, RelayPayload::Unsupported("location".to_string()));
    }
}
