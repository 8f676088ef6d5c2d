use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::warn;

use eduhub_core::cashfree::{product_id, NewOrder};
use eduhub_core::error::{MatchError, PublishError};
use eduhub_core::matcher::{self, SearchResult};
use eduhub_core::telegraph::PublishedItem;

use crate::bot::utils::{chat_info, escape_html};
use crate::dialogue::parse_contact_details;
use crate::state::AppState;

/// Result sets larger than this go to a Telegraph page instead of the chat.
const INLINE_RESULTS_MAX: usize = 5;

/// One dialogue turn for a private chat: either a fresh search or the
/// contact details answering an earlier search.
pub async fn handle_text(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    text: &str,
) -> anyhow::Result<()> {
    if let Some(pending) = state.dialogues.pending(msg.chat.id).await {
        handle_contact_details(bot, msg, state, text, pending).await
    } else {
        handle_search(bot, msg, state, text).await
    }
}

async fn handle_search(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    text: &str,
) -> anyhow::Result<()> {
    let query = text.trim();
    let results = match matcher::rank(query, &state.catalog) {
        Ok(results) => results,
        Err(MatchError::EmptyQuery) => {
            bot.send_message(msg.chat.id, "❌ Please enter a search term.")
                .await?;
            return Ok(());
        }
    };

    let mention = msg
        .from
        .as_ref()
        .map(|u| u.first_name.clone())
        .unwrap_or_default();

    if results.is_empty() {
        bot.send_message(
            msg.chat.id,
            format!(
                "❌ {}, no materials found for \"{}\".",
                escape_html(&mention),
                escape_html(query)
            ),
        )
        .parse_mode(ParseMode::Html)
        .await?;
        return Ok(());
    }

    let header = format!(
        "🔍 {}, found <b>{}</b> matches for <b>{}</b>:",
        escape_html(&mention),
        results.len(),
        escape_html(&short_query(query))
    );

    let body = if results.len() > INLINE_RESULTS_MAX {
        match publish_results(state, query, &results).await {
            Ok(url) => format!("<a href=\"{}\">View materials</a>", url),
            Err(e) => {
                warn!("Publishing results page failed, falling back inline: {}", e);
                inline_listing(state, &results).await
            }
        }
    } else {
        inline_listing(state, &results).await
    };

    bot.send_message(
        msg.chat.id,
        format!(
            "{}\n{}\n\n💳 To buy, reply with your details as:\nName, Email, Phone",
            header, body
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;

    state.dialogues.arm(msg.chat.id, results).await;
    Ok(())
}

async fn handle_contact_details(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    text: &str,
    pending: Vec<SearchResult>,
) -> anyhow::Result<()> {
    let details = match parse_contact_details(text) {
        Ok(details) => details,
        Err(e) => {
            // Reprompt; the dialogue stays armed for this chat.
            bot.send_message(msg.chat.id, e.user_message()).await?;
            return Ok(());
        }
    };

    state.datastore.save_chat(&chat_info(msg)).await?;

    let mut lines = Vec::with_capacity(pending.len());
    for result in &pending {
        let entry = &result.entry;
        let order = NewOrder {
            product_id: product_id(msg.chat.id.0, &entry.key),
            product_name: entry.label.clone(),
            amount: state.config.payment_amount,
            telegram_link: entry.telegram_link.clone(),
            customer_name: details.name.clone(),
            customer_email: details.email.clone(),
            customer_phone: details.phone.clone(),
        };

        match state.cashfree.create_order(&order).await {
            Ok(created) => lines.push(format!(
                "✅ <b>{}</b>: {}",
                escape_html(&entry.label),
                created.checkout_url
            )),
            Err(e) => {
                warn!("Order creation failed for {}: {}", entry.key, e);
                lines.push(format!(
                    "❌ <b>{}</b>: could not create a payment order",
                    escape_html(&entry.label)
                ));
            }
        }
    }

    bot.send_message(
        msg.chat.id,
        format!(
            "🧾 <b>Your payment links</b> (₹{} each):\n\n{}\n\n\
             Complete the payment and your material link will arrive here.",
            state.config.payment_amount,
            lines.join("\n")
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;

    state.dialogues.reset(msg.chat.id).await;
    Ok(())
}

async fn inline_listing(state: &AppState, results: &[SearchResult]) -> String {
    let mut lines = Vec::with_capacity(results.len());
    for result in results {
        let entry = &result.entry;
        let link = state.shortener.shorten(&entry.telegram_link, &entry.key).await;
        lines.push(format!(
            "• <b>{}</b> ({}) - {}",
            escape_html(&entry.label),
            escape_html(&entry.category),
            link
        ));
    }
    lines.join("\n")
}

async fn publish_results(
    state: &AppState,
    query: &str,
    results: &[SearchResult],
) -> Result<String, PublishError> {
    let mut items = Vec::with_capacity(results.len());
    for result in results {
        let entry = &result.entry;
        let link = state.shortener.shorten(&entry.telegram_link, &entry.key).await;
        items.push(PublishedItem {
            label: entry.label.clone(),
            category: entry.category.clone(),
            link,
        });
    }
    state.publisher.publish(query, &items).await
}

fn short_query(query: &str) -> String {
    query.split_whitespace().take(3).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_query_keeps_first_three_words() {
        assert_eq!(short_query("biology mtg latest edition pdf"), "biology mtg latest");
        assert_eq!(short_query("physics"), "physics");
    }
}
