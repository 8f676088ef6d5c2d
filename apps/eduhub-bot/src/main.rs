use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;

mod bot;
mod dialogue;
mod state;

use eduhub_core::cashfree::CashfreeClient;
use eduhub_core::catalog::Catalog;
use eduhub_core::config::Config;
use eduhub_core::datastore::DatastoreClient;
use eduhub_core::shortener::LinkShortener;
use eduhub_core::telegraph::TelegraphPublisher;

use crate::dialogue::DialogueStore;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    log::info!("Starting EduHub Study Bot...");

    let config = Config::from_env().expect("Incomplete environment configuration");
    let catalog = Catalog::load(&config.catalog_path, &config.material_bot)
        .expect("Failed to load material catalog");
    log::info!(
        "Catalog loaded: {} items across {} categories",
        catalog.entries().len(),
        catalog.categories().len()
    );

    let shortener = LinkShortener::new(
        config.shortener_base.clone(),
        config.shortener_api_key.clone(),
    );
    let publisher = TelegraphPublisher::new(config.telegraph_base.clone());
    let cashfree = CashfreeClient::new(
        config.cashfree_client_id.clone(),
        config.cashfree_client_secret.clone(),
        config.cashfree_env,
        config.base_url.clone(),
    );
    let datastore = DatastoreClient::new(config.datastore_url.clone());

    let bot = Bot::new(config.bot_token.clone());

    let state = AppState {
        config: Arc::new(config),
        catalog: Arc::new(catalog),
        shortener,
        publisher,
        cashfree,
        datastore,
        dialogues: DialogueStore::default(),
    };

    let (_tx, rx) = tokio::sync::broadcast::channel(1);

    bot::run_bot(bot, rx, state).await;
}
