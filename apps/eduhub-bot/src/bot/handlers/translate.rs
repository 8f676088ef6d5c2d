use serde::Deserialize;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::error;

use crate::bot::utils::escape_html;

const API_BASE: &str = "https://ftapi.pythonanywhere.com";

#[derive(Deserialize)]
struct TranslateResp {
    #[serde(rename = "source-language")]
    source_language: String,
    #[serde(rename = "source-text")]
    source_text: String,
    #[serde(rename = "destination-language")]
    destination_language: String,
    #[serde(rename = "destination-text")]
    destination_text: String,
    pronunciation: Option<Pronunciation>,
    translations: Option<Translations>,
}

#[derive(Deserialize)]
struct Pronunciation {
    #[serde(rename = "destination-text-audio")]
    destination_text_audio: Option<String>,
}

#[derive(Deserialize)]
struct Translations {
    #[serde(rename = "possible-translations")]
    possible_translations: Option<Vec<String>>,
}

/// `/translate [lang]` as a reply: translate the quoted message, defaulting
/// to English. Source language is auto-detected by the API.
pub async fn handle_translate(bot: &Bot, msg: &Message, text: &str) {
    let Some(replied) = msg.reply_to_message().and_then(|m| m.text()) else {
        let _ = bot
            .send_message(
                msg.chat.id,
                "Please reply to a message containing the text you want to translate.",
            )
            .await;
        return;
    };

    let dl = match text.split_whitespace().nth(1) {
        Some(code) if code.len() == 2 => code.to_lowercase(),
        _ => "en".to_string(),
    };

    match translate(&dl, replied).await {
        Ok(t) => {
            let mut reply = format!(
                "<b>Original ({}):</b> <code>{}</code>\n<b>Translation ({}):</b> <code>{}</code>",
                escape_html(&t.source_language),
                escape_html(t.source_text.trim()),
                escape_html(&t.destination_language),
                escape_html(&t.destination_text)
            );
            if let Some(audio) = t
                .pronunciation
                .and_then(|p| p.destination_text_audio)
            {
                reply.push_str(&format!("\n<a href=\"{}\">Audio</a>", audio));
            }
            if let Some(options) = t
                .translations
                .and_then(|tr| tr.possible_translations)
                .filter(|v| !v.is_empty())
            {
                reply.push_str(&format!(
                    "\n<b>Possible translations:</b> {}",
                    escape_html(&options.join(", "))
                ));
            }

            let _ = bot
                .send_message(msg.chat.id, reply)
                .parse_mode(ParseMode::Html)
                .await;
        }
        Err(e) => {
            error!("Translate error: {}", e);
            let _ = bot
                .send_message(msg.chat.id, "Translation failed. Please try again later.")
                .await;
        }
    }
}

async fn translate(dl: &str, text: &str) -> anyhow::Result<TranslateResp> {
    let url = format!(
        "{}/translate?dl={}&text={}",
        API_BASE,
        urlencoding::encode(dl),
        urlencoding::encode(text)
    );

    let client = reqwest::Client::new();
    let resp = client.get(&url).send().await?.error_for_status()?;
    Ok(resp.json().await?)
}
