//! Texts posted to the staff group on behalf of users.

use crate::{
    domain::{Language, Payload, UserId},
    identity::user_id_line,
    messaging::types::Sender,
};

/// Placeholder shown in the staff group for non-text payloads.
pub fn payload_summary(payload: &Payload) -> String {
    match payload {
        Payload::Text(text) => text.clone(),
        Payload::Photo { .. } => "📷 Фото".to_string(),
        Payload::Document { file_name, .. } => {
            format!("📎 {}", file_name.as_deref().unwrap_or("document"))
        }
        Payload::Voice { .. } => "🎤 Голосове повідомлення".to_string(),
    }
}

/// Annotated copy of a user's message, at most `max_len` chars.
///
/// The body is cut first, then the sender's name. The fixed lines (label,
/// language and id) are never cut, so `max_len` below their length is exceeded.
pub fn client_message(sender: &Sender, lang: Language, payload: &Payload, max_len: usize) -> String {
    const LEAD: &str = "💬 Повідомлення від клієнта\n👤 ";
    let tail = format!("\n🌍 {}\n{}\n\n", lang.code(), user_id_line(sender.user_id));
    let fixed = LEAD.chars().count() + tail.chars().count();
    let name = truncate_chars(&sender.first_name, max_len.saturating_sub(fixed));

    let header = format!("{LEAD}{name}{tail}");
    let body = payload_summary(payload);
    let budget = max_len.saturating_sub(header.chars().count());
    format!("{header}{}", truncate_chars(&body, budget))
}

/// Notification about a service picked from the menu.
pub fn new_request(sender: &Sender, lang: Language, service: &str) -> String {
    format!(
        "📩 Нова заявка\n👤 {}\n🌍 Мова: {}\n💬 Послуга: {}\n{}",
        sender.full_name(),
        lang.code(),
        service,
        user_id_line(sender.user_id)
    )
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 3 {
        return s.chars().take(max_chars).collect();
    }
    let mut out = s.chars().take(max_chars - 3).collect::<String>();
    out.push_str("...");
    out
}

/// For log lines; the staff group already shows the full id.
pub fn short_user(user_id: UserId, username: Option<&str>) -> String {
    match username {
        Some(u) => format!("{user_id} (@{u})"),
        None => user_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::extract_user_id;

    fn sender() -> Sender {
        Sender {
            user_id: UserId(777),
            first_name: "Ann".to_string(),
            last_name: Some("Lee".to_string()),
            username: Some("ann".to_string()),
        }
    }

    #[test]
    fn client_message_layout() {
        let msg = client_message(
            &sender(),
            Language::En,
            &Payload::Text("Need a site".to_string()),
            4096,
        );
        assert_eq!(
            msg,
            "💬 Повідомлення від клієнта\n👤 Ann\n🌍 en\n🆔 ID користувача: 777\n\nNeed a site"
        );
        assert_eq!(extract_user_id(Some(&msg)), Some(UserId(777)));
    }

    #[test]
    fn media_placeholders() {
        let photo = Payload::Photo {
            file_id: "p".to_string(),
            caption: Some("look".to_string()),
        };
        let doc = Payload::Document {
            file_id: "d".to_string(),
            file_name: Some("brief.pdf".to_string()),
            caption: None,
        };
        let voice = Payload::Voice {
            file_id: "v".to_string(),
        };
        assert_eq!(payload_summary(&photo), "📷 Фото");
        assert_eq!(payload_summary(&doc), "📎 brief.pdf");
        assert_eq!(payload_summary(&voice), "🎤 Голосове повідомлення");
    }

    #[test]
    fn long_text_is_cut_but_keeps_the_id() {
        let long = "x".repeat(5000);
        let msg = client_message(&sender(), Language::Ua, &Payload::Text(long), 4096);
        assert_eq!(msg.chars().count(), 4096);
        assert!(msg.ends_with("..."));
        assert_eq!(extract_user_id(Some(&msg)), Some(UserId(777)));
    }

    #[test]
    fn long_name_is_cut_to_fit_the_limit() {
        let mut s = sender();
        s.user_id = UserId(i64::MIN);
        s.first_name = "Ж".repeat(300);
        let msg = client_message(&s, Language::En, &Payload::Text("hi".to_string()), 256);
        assert!(msg.chars().count() <= 256);
        assert!(msg.contains("Ж..."));
        assert!(msg.contains("🌍 en"));
    }

    #[test]
    fn new_request_layout() {
        let msg = new_request(&sender(), Language::Pl, "design");
        assert_eq!(
            msg,
            "📩 Нова заявка\n👤 Ann Lee\n🌍 Мова: pl\n💬 Послуга: design\n🆔 ID користувача: 777"
        );
    }

    #[test]
    fn short_user_formats() {
        assert_eq!(short_user(UserId(1), Some("bob")), "1 (@bob)");
        assert_eq!(short_user(UserId(1), None), "1");
    }
}
