use chrono::Utc;
use teloxide::types::{Chat, Message};

use eduhub_core::datastore::ChatInfo;

/// Escape text for ParseMode::Html messages.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Datastore record for the chat a message arrived from.
pub fn chat_info(msg: &Message) -> ChatInfo {
    let chat = &msg.chat;
    ChatInfo {
        id: chat.id.0,
        kind: chat_kind(chat).to_string(),
        title: chat.title().map(str::to_string),
        first_name: chat.first_name().map(str::to_string),
        username: chat.username().map(str::to_string),
        timestamp: Utc::now().timestamp_millis(),
    }
}

pub fn chat_kind(chat: &Chat) -> &'static str {
    if chat.is_private() {
        "private"
    } else if chat.is_group() {
        "group"
    } else if chat.is_supergroup() {
        "supergroup"
    } else {
        "channel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html_metacharacters() {
        assert_eq!(escape_html("a<b> & c"), "a&lt;b&gt; &amp; c");
        assert_eq!(escape_html("plain"), "plain");
    }
}
