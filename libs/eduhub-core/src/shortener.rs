use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::RwLock;

/// Downstream service rejects aliases longer than this.
const MAX_ALIAS_LEN: usize = 30;

/// Memoizing client for the link-shortening service.
///
/// Failures fall back to the original URL so a shortener outage never breaks
/// the surrounding flow. The cache lives for the process lifetime; the
/// catalog is small and static, so there is no eviction.
#[derive(Clone)]
pub struct LinkShortener {
    client: reqwest::Client,
    base: String,
    api_key: String,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

#[derive(Deserialize)]
struct ShortenResp {
    status: String,
    #[serde(rename = "shortenedUrl")]
    shortened_url: Option<String>,
}

impl LinkShortener {
    pub fn new(base: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base,
            api_key,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn shorten(&self, long_url: &str, alias_hint: &str) -> String {
        let alias = truncate_alias(alias_hint);

        {
            let cache = self.cache.read().await;
            if let Some(short) = cache.get(alias) {
                return short.clone();
            }
        }

        match self.request_short_url(long_url, alias).await {
            Some(short) => {
                let mut cache = self.cache.write().await;
                cache.insert(alias.to_string(), short.clone());
                short
            }
            None => long_url.to_string(),
        }
    }

    async fn request_short_url(&self, long_url: &str, alias: &str) -> Option<String> {
        let url = format!(
            "{}/api?api={}&url={}&alias={}",
            self.base,
            self.api_key,
            urlencoding::encode(long_url),
            alias
        );

        let resp = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Shortener request failed for alias {}: {}", alias, e);
                return None;
            }
        };

        match resp.json::<ShortenResp>().await {
            Ok(body) if body.status == "success" => body.shortened_url,
            Ok(body) => {
                tracing::warn!("Shortener rejected alias {}: status {}", alias, body.status);
                None
            }
            Err(e) => {
                tracing::warn!("Shortener returned malformed body for alias {}: {}", alias, e);
                None
            }
        }
    }

    /// Number of cached aliases. Used by tests.
    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Pre-seed the cache, bypassing the downstream service.
    pub async fn seed(&self, alias_hint: &str, short_url: &str) {
        let mut cache = self.cache.write().await;
        cache.insert(truncate_alias(alias_hint).to_string(), short_url.to_string());
    }
}

fn truncate_alias(alias: &str) -> &str {
    match alias.char_indices().nth(MAX_ALIAS_LEN) {
        Some((idx, _)) => &alias[..idx],
        None => alias,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_is_truncated_to_thirty_chars() {
        let long = "a".repeat(40);
        assert_eq!(truncate_alias(&long).len(), 30);
        assert_eq!(truncate_alias("short"), "short");
    }

    #[tokio::test]
    async fn cached_alias_skips_the_downstream_service() {
        // The base URL is unroutable; a cache hit must never touch it.
        let shortener = LinkShortener::new("http://127.0.0.1:1".into(), "key".into());
        shortener.seed("bio_mtg", "https://short.example/x").await;

        let got = shortener
            .shorten("https://t.me/Material_eduhubkmrbot?start=bio_mtg", "bio_mtg")
            .await;
        assert_eq!(got, "https://short.example/x");
        assert_eq!(shortener.cached_len().await, 1);
    }

    #[tokio::test]
    async fn truncated_hint_shares_the_cache_slot() {
        let shortener = LinkShortener::new("http://127.0.0.1:1".into(), "key".into());
        let hint = "x".repeat(35);
        shortener.seed(&hint, "https://short.example/y").await;

        let got = shortener.shorten("https://example.com/long", &hint).await;
        assert_eq!(got, "https://short.example/y");
        assert_eq!(shortener.cached_len().await, 1);
    }

    #[tokio::test]
    async fn failure_falls_back_to_original_url() {
        let shortener = LinkShortener::new("http://127.0.0.1:1".into(), "key".into());
        let got = shortener.shorten("https://example.com/long", "alias").await;
        assert_eq!(got, "https://example.com/long");
        // Failed lookups are not cached.
        assert_eq!(shortener.cached_len().await, 0);
    }
}
