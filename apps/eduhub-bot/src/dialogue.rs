use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use teloxide::types::ChatId;
use tokio::sync::RwLock;

use eduhub_core::matcher::SearchResult;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\d{10}$").unwrap();
}

/// Where one chat stands in the search → purchase dialogue.
#[derive(Debug, Clone, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingContactDetails { pending: Vec<SearchResult> },
}

/// Explicit per-chat conversation state, keyed by chat id. A message from
/// one chat can never be routed into another chat's pending order list.
#[derive(Clone, Default)]
pub struct DialogueStore {
    inner: Arc<RwLock<HashMap<ChatId, ConversationState>>>,
}

impl DialogueStore {
    /// Pending results for this chat, if it is awaiting contact details.
    pub async fn pending(&self, chat: ChatId) -> Option<Vec<SearchResult>> {
        let states = self.inner.read().await;
        match states.get(&chat) {
            Some(ConversationState::AwaitingContactDetails { pending }) => Some(pending.clone()),
            _ => None,
        }
    }

    pub async fn arm(&self, chat: ChatId, pending: Vec<SearchResult>) {
        let mut states = self.inner.write().await;
        states.insert(chat, ConversationState::AwaitingContactDetails { pending });
    }

    pub async fn reset(&self, chat: ChatId) {
        let mut states = self.inner.write().await;
        states.insert(chat, ConversationState::Idle);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactError {
    Shape,
    Email,
    Phone,
    EmailAndPhone,
}

impl ContactError {
    /// Reprompt text for the user; the dialogue state stays armed.
    pub fn user_message(self) -> &'static str {
        match self {
            ContactError::Shape => {
                "❌ Please send your details as three comma-separated fields:\nName, Email, Phone"
            }
            ContactError::Email => {
                "❌ That email address does not look valid. Please resend as:\nName, Email, Phone"
            }
            ContactError::Phone => {
                "❌ The phone number must be exactly 10 digits. Please resend as:\nName, Email, Phone"
            }
            ContactError::EmailAndPhone => {
                "❌ Both the email address and the phone number look invalid. Please resend as:\nName, Email, Phone"
            }
        }
    }
}

/// Parse a "name, email, phone" contact message.
pub fn parse_contact_details(text: &str) -> Result<ContactDetails, ContactError> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(ContactError::Shape);
    }

    let (name, email, phone) = (parts[0], parts[1], parts[2]);
    let email_ok = EMAIL_RE.is_match(email);
    let phone_ok = PHONE_RE.is_match(phone);
    match (email_ok, phone_ok) {
        (false, false) => Err(ContactError::EmailAndPhone),
        (false, true) => Err(ContactError::Email),
        (true, false) => Err(ContactError::Phone),
        (true, true) => Ok(ContactDetails {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eduhub_core::catalog::CatalogEntry;

    fn result(key: &str) -> SearchResult {
        SearchResult {
            entry: CatalogEntry {
                category: "Biology".to_string(),
                label: "Biology MTG".to_string(),
                key: key.to_string(),
                telegram_link: format!("https://t.me/Material_eduhubkmrbot?start={}", key),
            },
            rank: 100,
        }
    }

    #[test]
    fn accepts_valid_contact_details() {
        let details = parse_contact_details("John Doe, john@example.com, 9876543210").unwrap();
        assert_eq!(details.name, "John Doe");
        assert_eq!(details.email, "john@example.com");
        assert_eq!(details.phone, "9876543210");
    }

    #[test]
    fn rejects_bad_email_and_phone_together() {
        assert_eq!(
            parse_contact_details("John Doe, not-an-email, 12345"),
            Err(ContactError::EmailAndPhone)
        );
    }

    #[test]
    fn rejects_each_field_specifically() {
        assert_eq!(
            parse_contact_details("John, john-at-example.com, 9876543210"),
            Err(ContactError::Email)
        );
        assert_eq!(
            parse_contact_details("John, john@example.com, 98765"),
            Err(ContactError::Phone)
        );
        assert_eq!(
            parse_contact_details("John, john@example.com, 98765432100"),
            Err(ContactError::Phone)
        );
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(parse_contact_details("John Doe"), Err(ContactError::Shape));
        assert_eq!(
            parse_contact_details("John, john@example.com"),
            Err(ContactError::Shape)
        );
        assert_eq!(
            parse_contact_details(", john@example.com, 9876543210"),
            Err(ContactError::Shape)
        );
    }

    #[tokio::test]
    async fn search_arms_only_its_own_chat() {
        let store = DialogueStore::default();
        store.arm(ChatId(1), vec![result("bio_mtg")]).await;

        assert!(store.pending(ChatId(1)).await.is_some());
        assert!(store.pending(ChatId(2)).await.is_none());
    }

    #[tokio::test]
    async fn reset_returns_chat_to_idle() {
        let store = DialogueStore::default();
        store.arm(ChatId(1), vec![result("bio_mtg")]).await;
        store.reset(ChatId(1)).await;
        assert!(store.pending(ChatId(1)).await.is_none());
    }

    #[tokio::test]
    async fn second_search_replaces_pending_results() {
        let store = DialogueStore::default();
        store.arm(ChatId(1), vec![result("bio_mtg")]).await;
        store.arm(ChatId(1), vec![result("phy_mtg"), result("chem_mtg")]).await;

        let pending = store.pending(ChatId(1)).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].entry.key, "phy_mtg");
    }
}
