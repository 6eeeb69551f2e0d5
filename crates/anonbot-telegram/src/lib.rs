//! Telegram adapter (teloxide).
//!
//! This crate implements the `anonbot-core` RelayTransport over the Telegram
//! Bot API and feeds Telegram updates into the core router.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode, Recipient},
    ApiError, RequestError,
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use anonbot_core::{
    domain::{ChatId, UserId},
    errors::{DeliveryError, Error, LookupError},
    messaging::{port::RelayTransport, types::InlineKeyboard},
    payload::RelayPayload,
    Result,
};

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
    retry_on_flood: bool,
}

impl TelegramTransport {
    pub fn new(bot: Bot, retry_on_flood: bool) -> Self {
        Self {
            bot,
            retry_on_flood,
        }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn markup(keyboard: InlineKeyboard) -> InlineKeyboardMarkup {
        let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
            .buttons
            .into_iter()
            .map(|b| vec![InlineKeyboardButton::callback(b.label, b.callback_data)])
            .collect();
        InlineKeyboardMarkup::new(rows)
    }

    fn map_err(e: RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    /// Run a request, waiting out a single flood-control (429) response if enabled.
    async fn with_retry<T, Fut>(
        &self,
        mut op: impl FnMut() -> Fut,
    ) -> std::result::Result<T, RequestError>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        let max_retries = usize::from(self.retry_on_flood);
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(RequestError::RetryAfter(d)) if attempts < max_retries => {
                    attempts += 1;
                    tracing::debug!(wait = ?d, "telegram flood control, retrying once");
                    sleep(d).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn delivery_error(e: RequestError) -> DeliveryError {
    match e {
        RequestError::Api(ApiError::BotBlocked) => DeliveryError::Blocked,
        RequestError::Api(
            api @ (ApiError::ChatNotFound
            | ApiError::UserNotFound
            | ApiError::UserDeactivated
            | ApiError::CantInitiateConversation),
        ) => DeliveryError::Unreachable(api.to_string()),
        other => DeliveryError::Platform(other.to_string()),
    }
}

fn lookup_error(e: RequestError) -> LookupError {
    match e {
        RequestError::Api(ApiError::ChatNotFound | ApiError::UserNotFound) => LookupError::NotFound,
        RequestError::Api(ApiError::BotBlocked | ApiError::CantInitiateConversation) => {
            LookupError::Private
        }
        other => LookupError::Platform(other.to_string()),
    }
}

#[async_trait]
impl RelayTransport for TelegramTransport {
    async fn resolve_handle(&self, handle: &str) -> std::result::Result<UserId, LookupError> {
        let chat = self
            .with_retry(|| {
                self.bot
                    .get_chat(Recipient::ChannelUsername(format!("@{handle}")))
            })
            .await
            .map_err(lookup_error)?;

        // Public groups and channels have handles too; only people can be written to.
        if !chat.is_private() {
            return Err(LookupError::NotFound);
        }
        Ok(UserId(chat.id.0))
    }

    async fn deliver(
        &self,
        destination: ChatId,
        payload: &RelayPayload,
        controls: Option<InlineKeyboard>,
    ) -> std::result::Result<(), DeliveryError> {
        let chat = Self::tg_chat(destination);
        let markup = controls.map(Self::markup);

        let sent = match payload {
            RelayPayload::Text(text) => {
                self.with_retry(|| {
                    let req = self.bot.send_message(chat, text.clone());
                    match &markup {
                        Some(m) => req.reply_markup(m.clone()),
                        None => req,
                    }
                })
                .await
            }
            RelayPayload::Photo(media) => {
                self.with_retry(|| {
                    let mut req = self
                        .bot
                        .send_photo(chat, InputFile::file_id(media.file_id.clone()));
                    if let Some(c) = &media.caption {
                        req = req.caption(c.clone());
                    }
                    if let Some(m) = &markup {
                        req = req.reply_markup(m.clone());
                    }
                    req
                })
                .await
            }
            RelayPayload::Video(media) => {
                self.with_retry(|| {
                    let mut req = self
                        .bot
                        .send_video(chat, InputFile::file_id(media.file_id.clone()));
                    if let Some(c) = &media.caption {
                        req = req.caption(c.clone());
                    }
                    if let Some(m) = &markup {
                        req = req.reply_markup(m.clone());
                    }
                    req
                })
                .await
            }
            RelayPayload::Document(media) => {
                self.with_retry(|| {
                    let mut req = self
                        .bot
                        .send_document(chat, InputFile::file_id(media.file_id.clone()));
                    if let Some(c) = &media.caption {
                        req = req.caption(c.clone());
                    }
                    if let Some(m) = &markup {
                        req = req.reply_markup(m.clone());
                    }
                    req
                })
                .await
            }
            RelayPayload::Voice(media) => {
                self.with_retry(|| {
                    let mut req = self
                        .bot
                        .send_voice(chat, InputFile::file_id(media.file_id.clone()));
                    if let Some(c) = &media.caption {
                        req = req.caption(c.clone());
                    }
                    if let Some(m) = &markup {
                        req = req.reply_markup(m.clone());
                    }
                    req
                })
                .await
            }
            RelayPayload::Audio(media) => {
                self.with_retry(|| {
                    let mut req = self
                        .bot
                        .send_audio(chat, InputFile::file_id(media.file_id.clone()));
                    if let Some(c) = &media.caption {
                        req = req.caption(c.clone());
                    }
                    if let Some(m) = &markup {
                        req = req.reply_markup(m.clone());
                    }
                    req
                })
                .await
            }
            RelayPayload::Unsupported(kind) => {
                return Err(DeliveryError::Platform(format!(
                    "{kind} messages cannot be relayed"
                )));
            }
        };

        sent.map(|_| ()).map_err(delivery_error)
    }

    async fn notify(&self, chat_id: ChatId, html: &str) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .send_message(Self::tg_chat(chat_id), html.to_string())
                .parse_mode(ParseMode::Html)
        })
        .await
        .map_err(Self::map_err)?;
        Ok(())
    }

    async fn acknowledge_action(&self, action_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(action_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await
        .map_err(Self::map_err)?;
        Ok(())
    }
}
