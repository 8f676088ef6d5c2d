use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use tracing::{error, info, warn};

use eduhub_core::datastore::LogRecord;

use crate::bot::handlers::{study, translate};
use crate::bot::utils::{chat_info, escape_html};
use crate::state::AppState;

lazy_static! {
    static ref CHAT_ID_RE: Regex = Regex::new(r"Chat ID: (\d+)").unwrap();
}

/// Logs longer than this go out as a document instead of a message.
const MAX_INLINE_LOG_LEN: usize = 3500;

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    if let Some(members) = msg.new_chat_members() {
        handle_new_members(&bot, &msg, &state, members).await;
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };
    info!("Received message from chat {}: {:?}", msg.chat.id, text);

    // Interaction log; best-effort.
    if let Some(user) = msg.from.as_ref() {
        let record = LogRecord {
            text: text.to_string(),
            user_id: user.id.0 as i64,
            username: user.username.clone(),
            first_name: Some(user.first_name.clone()),
            timestamp: Utc::now().timestamp_millis(),
        };
        if let Err(e) = state.datastore.log_message(msg.chat.id.0, &record).await {
            warn!("Failed to log message for chat {}: {}", msg.chat.id, e);
        }
    }

    let is_admin = msg.from.as_ref().map(|u| u.id.0 as i64) == Some(state.config.admin_chat_id);

    if text.starts_with("/start") {
        let _ = save_chat(&state, &msg).await;
        let _ = bot
            .send_message(
                msg.chat.id,
                "👋 Welcome! Send me the name of the study material you are looking for \
                 and I will find it for you.\n\nUse /about to learn more.",
            )
            .await;
    } else if text.starts_with("/about") {
        let _ = bot
            .send_message(
                msg.chat.id,
                "📚 <b>EduHub Study Material Bot</b>\n\n\
                 Search NEET/JEE study materials, pay securely online and receive your \
                 material link right here.\n\n\
                 • Send any search term to find materials\n\
                 • /contact &lt;message&gt; - reach the admin\n\
                 • /translate - translate a replied message",
            )
            .parse_mode(ParseMode::Html)
            .await;
    } else if text.starts_with("/contact") {
        handle_contact(&bot, &msg, &state, text).await;
    } else if text.starts_with("/reply") {
        handle_admin_reply(&bot, &msg, &state, text, is_admin).await;
    } else if text.starts_with("/broadcast") {
        handle_broadcast(&bot, &msg, &state, text, is_admin).await;
    } else if text.starts_with("/logs") {
        handle_logs(&bot, &msg, &state, text, is_admin).await;
    } else if text.starts_with("/translate") {
        translate::handle_translate(&bot, &msg, text).await;
    } else if is_swipe_reply(&msg, &state) {
        handle_swipe_reply(&bot, &msg, text).await;
    } else if msg.chat.is_private() {
        // Search is one-to-one only; group chats keep commands only.
        if let Err(e) = study::handle_text(&bot, &msg, &state, text).await {
            error!("Study dialogue failed for chat {}: {:?}", msg.chat.id, e);
            let _ = bot
                .send_message(msg.chat.id, "❌ Something went wrong. Please try again later.")
                .await;
        }
    }

    Ok(())
}

async fn handle_new_members(bot: &Bot, msg: &Message, state: &AppState, members: &[teloxide::types::User]) {
    let already_seen = save_chat(state, msg).await;
    if already_seen {
        return;
    }

    let names: Vec<String> = members
        .iter()
        .filter(|u| !u.is_bot)
        .map(|u| escape_html(&u.first_name))
        .collect();
    if names.is_empty() {
        return;
    }

    let _ = bot
        .send_message(
            msg.chat.id,
            format!(
                "👋 Welcome {}! Send me a study-material name to search the catalog.",
                names.join(", ")
            ),
        )
        .await;
}

/// Best-effort idempotent chat record; returns whether the chat was already
/// known.
async fn save_chat(state: &AppState, msg: &Message) -> bool {
    match state.datastore.save_chat(&chat_info(msg)).await {
        Ok(seen) => seen,
        Err(e) => {
            warn!("Failed to save chat {}: {}", msg.chat.id, e);
            false
        }
    }
}

async fn handle_contact(bot: &Bot, msg: &Message, state: &AppState, text: &str) {
    let inline = text.trim_start_matches("/contact").trim();
    let quoted = msg.reply_to_message().and_then(|m| m.text());
    let user_message = if !inline.is_empty() {
        inline
    } else if let Some(quoted) = quoted {
        quoted
    } else {
        let _ = bot
            .send_message(
                msg.chat.id,
                "Please provide a message or reply to a message using /contact.",
            )
            .await;
        return;
    };

    let delivered = bot
        .send_message(
            ChatId(state.config.admin_chat_id),
            format!(
                "<b>Contact Message</b>\nChat ID: {}\n\nMessage:\n{}",
                msg.chat.id.0,
                escape_html(user_message)
            ),
        )
        .parse_mode(ParseMode::Html)
        .await;

    match delivered {
        Ok(_) => {
            let _ = bot
                .send_message(msg.chat.id, "Your message has been sent to the admin!")
                .await;
        }
        Err(e) => {
            error!("Failed to forward contact message: {}", e);
            let _ = bot
                .send_message(msg.chat.id, "❌ Could not deliver your message. Try again later.")
                .await;
        }
    }
}

async fn handle_admin_reply(bot: &Bot, msg: &Message, _state: &AppState, text: &str, is_admin: bool) {
    if !is_admin {
        let _ = bot
            .send_message(msg.chat.id, "You are not authorized to use this command.")
            .await;
        return;
    }

    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() < 3 {
        let _ = bot
            .send_message(msg.chat.id, "Usage:\n/reply <chat_id> <message>")
            .await;
        return;
    }

    let Ok(target) = parts[1].parse::<i64>() else {
        let _ = bot
            .send_message(msg.chat.id, format!("Invalid chat ID: {}", parts[1]))
            .await;
        return;
    };
    let reply = parts[2..].join(" ");

    let sent = bot
        .send_message(
            ChatId(target),
            format!("<b>Admin's Reply:</b>\n{}", escape_html(&reply)),
        )
        .parse_mode(ParseMode::Html)
        .await;

    let _ = match sent {
        Ok(_) => bot.send_message(msg.chat.id, format!("Reply sent to {}", target)).await,
        Err(e) => {
            error!("Admin reply to {} failed: {}", target, e);
            bot.send_message(msg.chat.id, format!("Failed to send reply to {}", target))
                .await
        }
    };
}

async fn handle_broadcast(bot: &Bot, msg: &Message, state: &AppState, text: &str, is_admin: bool) {
    if !is_admin {
        let _ = bot
            .send_message(msg.chat.id, "You are not authorized to use this command.")
            .await;
        return;
    }

    let body = text.trim_start_matches("/broadcast").trim();
    if body.is_empty() {
        let _ = bot
            .send_message(msg.chat.id, "Usage:\n/broadcast <message>")
            .await;
        return;
    }

    let chat_ids = match state.datastore.chat_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            error!("Broadcast aborted, could not list chats: {}", e);
            let _ = bot
                .send_message(msg.chat.id, "❌ Could not fetch the chat list.")
                .await;
            return;
        }
    };

    let mut sent = 0usize;
    let mut failed = 0usize;
    for chat_id in &chat_ids {
        match bot.send_message(ChatId(*chat_id), body).await {
            Ok(_) => sent += 1,
            Err(e) => {
                failed += 1;
                warn!("Broadcast to {} failed: {}", chat_id, e);
            }
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }

    let _ = bot
        .send_message(
            msg.chat.id,
            format!("Broadcast complete: {}/{} sent, {} failed", sent, chat_ids.len(), failed),
        )
        .await;
}

async fn handle_logs(bot: &Bot, msg: &Message, state: &AppState, text: &str, is_admin: bool) {
    if !is_admin {
        let _ = bot
            .send_message(msg.chat.id, "You are not authorized to use this command.")
            .await;
        return;
    }

    let selector = text.trim_start_matches("/logs").trim();
    if selector.is_empty() {
        let _ = bot
            .send_message(msg.chat.id, "Usage:\n/logs <YYYY-MM-DD | chat_id>")
            .await;
        return;
    }

    let logs = match state.datastore.logs_for(selector).await {
        Ok(logs) => logs,
        Err(e) => {
            error!("Failed to fetch logs for {}: {}", selector, e);
            let _ = bot
                .send_message(msg.chat.id, "❌ Could not fetch logs from the datastore.")
                .await;
            return;
        }
    };

    if logs.len() > MAX_INLINE_LOG_LEN {
        let file = InputFile::memory(logs.into_bytes()).file_name(format!("logs_{}.txt", selector));
        let _ = bot.send_document(msg.chat.id, file).await;
    } else {
        let _ = bot.send_message(msg.chat.id, logs).await;
    }
}

/// Admin replying to a forwarded contact message relays the reply to the
/// chat id embedded in the quoted text.
fn is_swipe_reply(msg: &Message, state: &AppState) -> bool {
    msg.chat.id.0 == state.config.admin_chat_id
        && msg
            .reply_to_message()
            .and_then(|m| m.text())
            .is_some_and(|quoted| CHAT_ID_RE.is_match(quoted))
}

async fn handle_swipe_reply(bot: &Bot, msg: &Message, text: &str) {
    let Some(quoted) = msg.reply_to_message().and_then(|m| m.text()) else {
        return;
    };
    let Some(target) = CHAT_ID_RE
        .captures(quoted)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
    else {
        return;
    };

    if let Err(e) = bot
        .send_message(
            ChatId(target),
            format!("<b>Admin's Reply:</b>\n{}", escape_html(text)),
        )
        .parse_mode(ParseMode::Html)
        .await
    {
        error!("Failed to send swipe reply to {}: {}", target, e);
    }
}
