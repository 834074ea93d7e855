//! Language and service menus, localized texts, and bot commands.

use crate::{
    domain::Language,
    messaging::types::{InlineButton, InlineKeyboard, ReplyKeyboard},
};

pub const LANGUAGE_PROMPT: &str = "Оберіть мову / Choose language";
pub const CHAT_CLOSED: &str = "Чат закрито ✅";

/// Language menu rows, in display order.
const LANGUAGE_LABELS: [(&str, Language); 3] = [
    ("🇬🇧 English", Language::En),
    ("🇵🇱 Polska", Language::Pl),
    ("🇺🇦 Українська", Language::Ua),
];

/// Service codes sent back as callback data.
pub const SERVICE_CODES: [&str; 5] = ["site", "design", "content", "bot", "other"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Close,
}

/// Recognise `/start` and `/close`, tolerating `@botname` and trailing args.
pub fn parse_command(text: &str) -> Option<BotCommand> {
    let first = text.trim().split_whitespace().next()?;
    let name = first.strip_prefix('/')?.split('@').next().unwrap_or("");
    match name.to_lowercase().as_str() {
        "start" => Some(BotCommand::Start),
        "close" => Some(BotCommand::Close),
        _ => None,
    }
}

impl Language {
    /// Map a language-menu label back to its language.
    pub fn from_label(text: &str) -> Option<Language> {
        let text = text.trim();
        LANGUAGE_LABELS
            .iter()
            .find(|(label, _)| *label == text)
            .map(|(_, lang)| *lang)
    }
}

pub fn language_keyboard() -> ReplyKeyboard {
    ReplyKeyboard {
        labels: LANGUAGE_LABELS
            .iter()
            .map(|(label, _)| label.to_string())
            .collect(),
        resize: true,
        one_time: true,
    }
}

pub fn services_prompt(lang: Language) -> &'static str {
    match lang {
        Language::Ua => "Яка послуга вам потрібна?",
        Language::En => "What service do you need?",
        Language::Pl => "Jakiej usługi potrzebujesz?",
    }
}

fn service_labels(lang: Language) -> [&'static str; 5] {
    match lang {
        Language::Ua => [
            "🌐 Розробка сайту",
            "🎨 Дизайн",
            "🎥 Фото/Відео/Контент",
            "🤖 Чат бот",
            "❓ Інше питання",
        ],
        Language::En => [
            "🌐 Website Development",
            "🎨 Design",
            "🎥 Photo/Video/Content",
            "🤖 Chatbot",
            "❓ Other Question",
        ],
        Language::Pl => [
            "🌐 Tworzenie stron",
            "🎨 Projektowanie",
            "🎥 Zdjęcia / Wideo",
            "🤖 Chatbot",
            "❓ Inne pytanie",
        ],
    }
}

pub fn service_keyboard(lang: Language) -> InlineKeyboard {
    InlineKeyboard::new(
        service_labels(lang)
            .iter()
            .zip(SERVICE_CODES)
            .map(|(label, code)| InlineButton {
                label: label.to_string(),
                callback_data: code.to_string(),
            })
            .collect(),
    )
}

pub fn thank_you(lang: Language) -> &'static str {
    match lang {
        Language::Ua => "Дякуємо! Менеджер скоро з вами зв'яжеться 🙌",
        Language::En => "Thank you! Our manager will contact you shortly 🙌",
        Language::Pl => "Dziękujemy! Menedżer wkrótce się z Tobą skontaktuje 🙌",
    }
}
