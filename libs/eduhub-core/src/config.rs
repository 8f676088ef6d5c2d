use anyhow::Result;

use crate::cashfree::CashfreeEnv;

/// Runtime configuration shared by the bot and the gateway binaries.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    /// Chat that receives payment summaries and /contact messages.
    pub admin_chat_id: i64,
    /// Public base URL of the gateway, used for return/notify URLs.
    pub base_url: String,
    pub cashfree_client_id: String,
    pub cashfree_client_secret: String,
    pub cashfree_env: CashfreeEnv,
    /// Fixed price per catalog item, in INR.
    pub payment_amount: f64,
    pub shortener_api_key: String,
    pub shortener_base: String,
    pub telegraph_base: String,
    /// Firebase-style realtime database root URL.
    pub datastore_url: String,
    /// Username of the bot that delivers the material on /start deep links.
    pub material_bot: String,
    pub catalog_path: String,
    pub listen_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let cashfree_env = match std::env::var("CASHFREE_ENV").as_deref() {
            Ok("production") => CashfreeEnv::Production,
            _ => CashfreeEnv::Sandbox,
        };

        Ok(Self {
            bot_token: std::env::var("BOT_TOKEN")?,
            admin_chat_id: std::env::var("ADMIN_CHAT_ID")?.parse()?,
            base_url: std::env::var("BASE_URL")?,
            cashfree_client_id: std::env::var("CASHFREE_CLIENT_ID")?,
            cashfree_client_secret: std::env::var("CASHFREE_CLIENT_SECRET")?,
            cashfree_env,
            payment_amount: std::env::var("PAYMENT_AMOUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100.0),
            shortener_api_key: std::env::var("SHORTENER_API_KEY").unwrap_or_default(),
            shortener_base: std::env::var("SHORTENER_BASE")
                .unwrap_or_else(|_| "https://adrinolinks.in".to_string()),
            telegraph_base: std::env::var("TELEGRAPH_BASE")
                .unwrap_or_else(|_| "https://api.telegra.ph".to_string()),
            datastore_url: std::env::var("DATASTORE_URL")?,
            material_bot: std::env::var("MATERIAL_BOT")
                .unwrap_or_else(|_| "Material_eduhubkmrbot".to_string()),
            catalog_path: std::env::var("CATALOG_PATH")
                .unwrap_or_else(|_| "data/material.json".to_string()),
            listen_port: std::env::var("LISTEN_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
        })
    }
}
