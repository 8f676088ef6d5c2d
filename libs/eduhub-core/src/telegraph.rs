use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::error::PublishError;

/// One ranked result ready for publication: its label, category and the
/// (already shortened) delivery link.
#[derive(Debug, Clone)]
pub struct PublishedItem {
    pub label: String,
    pub category: String,
    pub link: String,
}

/// Publishes oversized result sets as read-only Telegraph pages.
///
/// The authoring credential is obtained lazily on first use and reused for
/// the process lifetime.
#[derive(Clone)]
pub struct TelegraphPublisher {
    client: reqwest::Client,
    base: String,
    access_token: Arc<RwLock<Option<String>>>,
}

#[derive(Deserialize)]
struct TelegraphResp<T> {
    ok: bool,
    result: Option<T>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct TelegraphAccount {
    access_token: String,
}

#[derive(Deserialize)]
struct TelegraphPage {
    path: String,
}

impl TelegraphPublisher {
    pub fn new(base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base,
            access_token: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn publish(&self, query: &str, items: &[PublishedItem]) -> Result<String, PublishError> {
        let token = self.obtain_access_token().await?;

        let title = format!("Study Material: {}", query.chars().take(50).collect::<String>());
        let content = page_content(query, items).to_string();

        let resp = self
            .client
            .post(format!("{}/createPage", self.base))
            .form(&[
                ("access_token", token.as_str()),
                ("title", title.as_str()),
                ("author_name", "Study Bot"),
                ("content", content.as_str()),
                ("return_content", "true"),
            ])
            .send()
            .await
            .map_err(|e| PublishError::Failed(e.to_string()))?;

        let body: TelegraphResp<TelegraphPage> = resp
            .json()
            .await
            .map_err(|e| PublishError::Failed(e.to_string()))?;

        match body.result {
            Some(page) if body.ok => Ok(format!("https://telegra.ph/{}", page.path)),
            _ => Err(PublishError::Failed(
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }

    async fn obtain_access_token(&self) -> Result<String, PublishError> {
        {
            let token = self.access_token.read().await;
            if let Some(token) = token.as_ref() {
                return Ok(token.clone());
            }
        }

        let resp = self
            .client
            .post(format!("{}/createAccount", self.base))
            .form(&[("short_name", "studybot"), ("author_name", "Study Bot")])
            .send()
            .await
            .map_err(|e| PublishError::Unavailable(e.to_string()))?;

        let body: TelegraphResp<TelegraphAccount> = resp
            .json()
            .await
            .map_err(|e| PublishError::Unavailable(e.to_string()))?;

        match body.result {
            Some(account) if body.ok => {
                let mut token = self.access_token.write().await;
                *token = Some(account.access_token.clone());
                Ok(account.access_token)
            }
            _ => Err(PublishError::Unavailable(
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }
}

/// Telegraph node tree for one result page: heading, result links, and the
/// static instructional block.
fn page_content(query: &str, items: &[PublishedItem]) -> Value {
    let result_items: Vec<Value> = items
        .iter()
        .map(|item| {
            json!({
                "tag": "li",
                "children": [
                    "• ",
                    {"tag": "a", "attrs": {"href": item.link, "target": "_blank"}, "children": [item.label]},
                    format!(" ({})", item.category),
                ]
            })
        })
        .collect();

    json!([
        {"tag": "h3", "children": [format!("Results for: \"{}\"", query)]},
        {"tag": "p", "children": [format!("Found {} study materials:", items.len())]},
        {"tag": "ul", "children": result_items},
        {"tag": "hr"},
        {"tag": "h4", "children": ["ℹ️ Resources & Instructions"]},
        {"tag": "p", "children": [
            "📺 How to open link: ",
            {"tag": "a", "attrs": {"href": "https://youtu.be/S912R5lMShI?si=l5RsBbkbXaxFowbZ"}, "children": ["YouTube Guide"]},
        ]},
        {"tag": "p", "children": ["📚 Join more recommended bots:"]},
        {"tag": "ul", "children": [
            {"tag": "li", "children": [
                {"tag": "a", "attrs": {"href": "https://t.me/Material_eduhubkmrbot"}, "children": ["@Material_eduhubkmrbot"]},
                " - Study materials",
            ]},
            {"tag": "li", "children": [
                {"tag": "a", "attrs": {"href": "https://t.me/EduhubKMR_bot"}, "children": ["@EduhubKMR_bot"]},
                " - QuizBot",
            ]},
            {"tag": "li", "children": [
                {"tag": "a", "attrs": {"href": "https://t.me/NEETPW01"}, "children": ["@NEETPW01"]},
                " - Group For Discussion",
            ]},
            {"tag": "li", "children": [
                {"tag": "a", "attrs": {"href": "https://t.me/NEETUG_26"}, "children": ["@NEETUG_26"]},
                " - NEET JEE Channel",
            ]},
        ]},
        {"tag": "p", "attrs": {"style": "color: gray; font-size: 0.8em"}, "children": ["Generated by Study Bot"]},
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<PublishedItem> {
        vec![
            PublishedItem {
                label: "Biology MTG".into(),
                category: "Biology".into(),
                link: "https://short.example/bio".into(),
            },
            PublishedItem {
                label: "Physics MTG".into(),
                category: "Physics".into(),
                link: "https://short.example/phy".into(),
            },
        ]
    }

    #[test]
    fn content_contains_one_link_per_result() {
        let content = page_content("mtg", &items());
        let rendered = content.to_string();
        assert!(rendered.contains("https://short.example/bio"));
        assert!(rendered.contains("https://short.example/phy"));
        assert!(rendered.contains("Found 2 study materials:"));

        let list = content
            .as_array()
            .unwrap()
            .iter()
            .find(|node| node["tag"] == "ul")
            .unwrap();
        assert_eq!(list["children"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn title_query_is_echoed_in_heading() {
        let content = page_content("biology notes", &items());
        assert!(content.to_string().contains("Results for: \"biology notes\""));
    }
}
