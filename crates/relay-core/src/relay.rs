//! Message router: decides where every inbound update goes.
//!
//! - staff group reply → the user it refers to (no history)
//! - user message → annotated copy in the staff group, plus a history record
//! - `/start`, language labels, service buttons, `/close` → conversation flow

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    domain::{ChatId, Language, MessageKind, Payload, UserId},
    envelope::{client_message, new_request, short_user},
    flow::{self, BotCommand},
    history::{HistoryRecord, HistoryStore},
    identity::ReplyIndex,
    messaging::{
        port::MessagingPort,
        types::{CallbackQuery, IncomingUpdate, StaffMessage, UserMessage},
    },
    session::SessionState,
    Result,
};

/// What the router did with an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Routed {
    LanguageMenu,
    LanguageSelected(Language),
    Closed,
    ForwardedToStaff {
        user_id: UserId,
        kind: MessageKind,
        recorded: bool,
    },
    RequestSubmitted {
        user_id: UserId,
        service: String,
    },
    DeliveredToUser {
        user_id: UserId,
        kind: MessageKind,
    },
    Dropped(DropReason),
}

/// Why an update produced no delivery. None of these are reported to the sender.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// Staff message that is not a reply.
    NotAReply,
    /// Staff reply whose parent is neither indexed nor labelled with a user id.
    UnknownRecipient,
    /// Stickers, polls, locations and other kinds the relay does not carry.
    UnsupportedPayload,
    /// Button press without callback data.
    EmptyCallback,
    /// The transport rejected the send (already retried where retryable).
    SendFailed,
}

pub struct Relay {
    staff_chat: ChatId,
    messenger: Arc<dyn MessagingPort>,
    sessions: SessionState,
    replies: ReplyIndex,
    history: Arc<HistoryStore>,
}

impl Relay {
    pub fn new(
        staff_chat: ChatId,
        messenger: Arc<dyn MessagingPort>,
        history: Arc<HistoryStore>,
        replies: ReplyIndex,
    ) -> Self {
        Self {
            staff_chat,
            messenger,
            sessions: SessionState::new(),
            replies,
            history,
        }
    }

    pub fn staff_chat(&self) -> ChatId {
        self.staff_chat
    }

    pub fn sessions(&self) -> &SessionState {
        &self.sessions
    }

    pub fn replies(&self) -> &ReplyIndex {
        &self.replies
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Route one update. Transport and storage failures are logged here and
    /// never propagate to the caller.
    pub async fn handle(&self, update: IncomingUpdate) -> Routed {
        match update {
            IncomingUpdate::Staff(msg) => self.handle_staff(msg).await,
            IncomingUpdate::User(msg) => self.handle_user(msg).await,
            IncomingUpdate::Callback(q) => self.handle_callback(q).await,
        }
    }

    // ============== Staff group → user ==============

    async fn handle_staff(&self, msg: StaffMessage) -> Routed {
        let Some(replied) = msg.reply_to else {
            return Routed::Dropped(DropReason::NotAReply);
        };
        let Some(user_id) = self
            .replies
            .resolve(replied.message_id, replied.text.as_deref())
            .await
        else {
            debug!(
                message_id = replied.message_id.0,
                "staff reply without a known recipient"
            );
            return Routed::Dropped(DropReason::UnknownRecipient);
        };
        let Some(payload) = msg.payload else {
            return Routed::Dropped(DropReason::UnsupportedPayload);
        };

        match self.deliver(ChatId::from(user_id), &payload).await {
            Ok(()) => {
                info!(user = %user_id, kind = ?payload.kind(), "manager → user");
                Routed::DeliveredToUser {
                    user_id,
                    kind: payload.kind(),
                }
            }
            Err(e) => {
                warn!(user = %user_id, error = %e, "failed to deliver staff reply");
                Routed::Dropped(DropReason::SendFailed)
            }
        }
    }

    async fn deliver(&self, chat_id: ChatId, payload: &Payload) -> Result<()> {
        match payload {
            Payload::Text(text) => self.messenger.send_text(chat_id, text).await?,
            Payload::Photo { file_id, caption } => {
                self.messenger
                    .send_photo(chat_id, file_id, caption.as_deref())
                    .await?
            }
            Payload::Document {
                file_id, caption, ..
            } => {
                self.messenger
                    .send_document(chat_id, file_id, caption.as_deref())
                    .await?
            }
            Payload::Voice { file_id } => self.messenger.send_voice(chat_id, file_id).await?,
        };
        Ok(())
    }

    // ============== User → staff group ==============

    async fn handle_user(&self, msg: UserMessage) -> Routed {
        let user_id = msg.sender.user_id;

        if let Some(Payload::Text(text)) = &msg.payload {
            if let Some(cmd) = flow::parse_command(text) {
                return self.handle_command(cmd, &msg).await;
            }
            if let Some(lang) = Language::from_label(text) {
                return self.select_language(&msg, lang).await;
            }
        }

        let Some(payload) = msg.payload.as_ref() else {
            return Routed::Dropped(DropReason::UnsupportedPayload);
        };

        let lang = self.sessions.language(user_id).await;
        let max_len = self.messenger.capabilities().max_message_len;
        let text = client_message(&msg.sender, lang, payload, max_len);

        let sent = match self.messenger.send_text(self.staff_chat, &text).await {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    user = %short_user(user_id, msg.sender.username.as_deref()),
                    error = %e,
                    "failed to forward user message to staff group"
                );
                return Routed::Dropped(DropReason::SendFailed);
            }
        };
        self.replies.remember(sent.message_id, user_id).await;

        let kind = payload.kind();
        let recorded = match self
            .history
            .append(user_id, HistoryRecord::from_user(kind))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(user = %user_id, error = %e, "failed to persist chat history");
                false
            }
        };

        info!(
            user = %short_user(user_id, msg.sender.username.as_deref()),
            kind = ?kind,
            "user → staff"
        );
        Routed::ForwardedToStaff {
            user_id,
            kind,
            recorded,
        }
    }

    async fn handle_command(&self, cmd: BotCommand, msg: &UserMessage) -> Routed {
        match cmd {
            BotCommand::Start => {
                if let Err(e) = self
                    .messenger
                    .send_reply_keyboard(msg.chat_id, flow::LANGUAGE_PROMPT, flow::language_keyboard())
                    .await
                {
                    warn!(error = %e, "failed to send language menu");
                    return Routed::Dropped(DropReason::SendFailed);
                }
                Routed::LanguageMenu
            }
            BotCommand::Close => {
                self.sessions.clear(msg.sender.user_id).await;
                if let Err(e) = self.messenger.send_text(msg.chat_id, flow::CHAT_CLOSED).await {
                    warn!(error = %e, "failed to acknowledge /close");
                }
                Routed::Closed
            }
        }
    }

    async fn select_language(&self, msg: &UserMessage, lang: Language) -> Routed {
        self.sessions.set_language(msg.sender.user_id, lang).await;
        if let Err(e) = self
            .messenger
            .send_inline_keyboard(
                msg.chat_id,
                flow::services_prompt(lang),
                flow::service_keyboard(lang),
            )
            .await
        {
            warn!(error = %e, "failed to send service menu");
        }
        Routed::LanguageSelected(lang)
    }

    // ============== Service selection ==============

    async fn handle_callback(&self, q: CallbackQuery) -> Routed {
        let user_id = q.sender.user_id;
        let service = q.data.trim().to_string();

        if service.is_empty() {
            self.acknowledge(&q.callback_id).await;
            return Routed::Dropped(DropReason::EmptyCallback);
        }

        let lang = self.sessions.language(user_id).await;
        let text = new_request(&q.sender, lang, &service);
        let sent = self.messenger.send_text(self.staff_chat, &text).await;
        self.acknowledge(&q.callback_id).await;

        match sent {
            Ok(r) => self.replies.remember(r.message_id, user_id).await,
            Err(e) => {
                warn!(user = %user_id, service = %service, error = %e, "failed to post new request");
                return Routed::Dropped(DropReason::SendFailed);
            }
        }

        if let Err(e) = self
            .messenger
            .send_text(q.chat_id, flow::thank_you(lang))
            .await
        {
            warn!(user = %user_id, error = %e, "failed to thank user");
        }

        info!(user = %user_id, service = %service, "new request");
        Routed::RequestSubmitted { user_id, service }
    }

    async fn acknowledge(&self, callback_id: &str) {
        if let Err(e) = self.messenger.answer_callback_query(callback_id).await {
            debug!(error = %e, "failed to answer callback query");
        }
    }
}
