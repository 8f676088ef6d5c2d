use std::sync::Arc;

use eduhub_core::cashfree::CashfreeClient;
use eduhub_core::catalog::Catalog;
use eduhub_core::config::Config;
use eduhub_core::datastore::DatastoreClient;
use eduhub_core::shortener::LinkShortener;
use eduhub_core::telegraph::TelegraphPublisher;

use crate::dialogue::DialogueStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<Catalog>,
    pub shortener: LinkShortener,
    pub publisher: TelegraphPublisher,
    pub cashfree: CashfreeClient,
    pub datastore: DatastoreClient,
    pub dialogues: DialogueStore,
}
