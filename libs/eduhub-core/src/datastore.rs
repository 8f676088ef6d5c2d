use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chat record persisted once per chat, keyed by chat id.
#[derive(Debug, Clone, Serialize)]
pub struct ChatInfo {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub username: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub text: String,
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub timestamp: i64,
}

/// REST client for the remote interaction datastore (Firebase-style realtime
/// database: `GET`/`PUT`/`POST` on `{base}/{path}.json`).
///
/// Every call is a single round trip; callers treat failures as best-effort
/// and never let them abort a user-facing flow.
#[derive(Clone)]
pub struct DatastoreClient {
    client: reqwest::Client,
    base: String,
}

impl DatastoreClient {
    pub fn new(base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Record a chat if it has not been seen before. Returns whether the
    /// chat already existed.
    pub async fn save_chat(&self, chat: &ChatInfo) -> Result<bool> {
        let url = format!("{}/chats/{}.json", self.base, chat.id);

        let existing: Value = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .context("Failed to read chat record")?;
        if !existing.is_null() {
            return Ok(true);
        }

        self.client
            .put(&url)
            .json(chat)
            .send()
            .await?
            .error_for_status()
            .context("Failed to save chat record")?;
        Ok(false)
    }

    pub async fn log_message(&self, chat_id: i64, record: &LogRecord) -> Result<()> {
        let url = format!("{}/logs/{}.json", self.base, chat_id);
        self.client
            .post(&url)
            .json(record)
            .send()
            .await?
            .error_for_status()
            .context("Failed to append log record")?;
        Ok(())
    }

    /// All recorded chat ids; broadcast source.
    pub async fn chat_ids(&self) -> Result<Vec<i64>> {
        let url = format!("{}/chats.json", self.base);
        let chats: Option<HashMap<String, Value>> = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .context("Failed to read chat records")?;

        let mut ids: Vec<i64> = chats
            .unwrap_or_default()
            .keys()
            .filter_map(|k| k.parse().ok())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Formatted log text for a `YYYY-MM-DD` date (across chats) or a single
    /// chat id.
    pub async fn logs_for(&self, selector: &str) -> Result<String> {
        let text = if is_date_selector(selector) {
            let url = format!("{}/logs.json", self.base);
            let chats: Option<HashMap<String, HashMap<String, LogRecord>>> =
                self.client.get(&url).send().await?.json().await?;
            format_logs_for_date(chats.unwrap_or_default(), selector)
        } else {
            let url = format!("{}/logs/{}.json", self.base, selector);
            let records: Option<HashMap<String, LogRecord>> =
                self.client.get(&url).send().await?.json().await?;
            format_logs(records.unwrap_or_default().into_values().collect())
        };

        if text.is_empty() {
            Ok("No logs found for this date.".to_string())
        } else {
            Ok(text)
        }
    }
}

/// `YYYY-MM-DD` shape check for the /logs selector.
fn is_date_selector(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && s.char_indices()
            .all(|(i, c)| matches!(i, 4 | 7) || c.is_ascii_digit())
}

fn format_logs_for_date(
    chats: HashMap<String, HashMap<String, LogRecord>>,
    date: &str,
) -> String {
    let mut records: Vec<LogRecord> = chats
        .into_values()
        .flat_map(|records| records.into_values())
        .filter(|r| {
            DateTime::<Utc>::from_timestamp_millis(r.timestamp)
                .map(|ts| ts.format("%Y-%m-%d").to_string() == date)
                .unwrap_or(false)
        })
        .collect();
    records.sort_by_key(|r| r.timestamp);
    render_records(&records)
}

fn format_logs(mut records: Vec<LogRecord>) -> String {
    records.sort_by_key(|r| r.timestamp);
    render_records(&records)
}

fn render_records(records: &[LogRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let when = DateTime::<Utc>::from_timestamp_millis(record.timestamp)
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown time".to_string());
        out.push_str(&format!(
            "[{}] User: {} (@{}): {}\n",
            when,
            record.first_name.as_deref().unwrap_or("Unknown"),
            record.username.as_deref().unwrap_or("N/A"),
            record.text
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ts: i64, text: &str) -> LogRecord {
        LogRecord {
            text: text.to_string(),
            user_id: 42,
            username: Some("student".to_string()),
            first_name: Some("Asha".to_string()),
            timestamp: ts,
        }
    }

    #[test]
    fn date_selector_shape() {
        assert!(is_date_selector("2026-08-07"));
        assert!(!is_date_selector("2026-8-7"));
        assert!(!is_date_selector("123456789"));
        assert!(!is_date_selector("2026_08_07"));
    }

    #[test]
    fn renders_log_lines_in_time_order() {
        let text = format_logs(vec![record(1_700_000_100_000, "second"), record(1_700_000_000_000, "first")]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("first"));
        assert!(lines[1].contains("second"));
        assert!(lines[0].contains("Asha"));
        assert!(lines[0].contains("@student"));
    }

    #[test]
    fn date_filter_drops_other_days() {
        let mut by_chat = HashMap::new();
        let mut records = HashMap::new();
        // 2023-11-14 and 2023-11-15 respectively.
        records.insert("a".to_string(), record(1_699_999_200_000, "kept"));
        records.insert("b".to_string(), record(1_700_085_600_000, "dropped"));
        by_chat.insert("123".to_string(), records);

        let text = format_logs_for_date(by_chat, "2023-11-14");
        assert!(text.contains("kept"));
        assert!(!text.contains("dropped"));
    }

    #[test]
    fn missing_fields_fall_back_to_placeholders() {
        let mut r = record(1_700_000_000_000, "hello");
        r.username = None;
        r.first_name = None;
        let text = format_logs(vec![r]);
        assert!(text.contains("Unknown"));
        assert!(text.contains("@N/A"));
    }
}
