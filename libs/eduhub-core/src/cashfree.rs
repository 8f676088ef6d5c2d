use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::OrderError;

const API_VERSION: &str = "2022-09-01";

/// Gateway environment, selected by a single flag at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashfreeEnv {
    Production,
    Sandbox,
}

impl CashfreeEnv {
    fn api_base(self) -> &'static str {
        match self {
            CashfreeEnv::Production => "https://api.cashfree.com",
            CashfreeEnv::Sandbox => "https://sandbox.cashfree.com",
        }
    }

    fn checkout_base(self) -> &'static str {
        match self {
            CashfreeEnv::Production => "https://payments.cashfree.com",
            CashfreeEnv::Sandbox => "https://payments-test.cashfree.com",
        }
    }
}

/// Inputs for one payment order covering a single catalog item.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub product_id: String,
    pub product_name: String,
    pub amount: f64,
    pub telegram_link: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order_id: String,
    pub payment_session_id: String,
    pub checkout_url: String,
    pub telegram_link: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderDetails {
    pub order_note: Option<String>,
    pub order_status: Option<String>,
}

#[derive(Clone)]
pub struct CashfreeClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    env: CashfreeEnv,
    /// Public base URL of the gateway binary, for return/notify URLs.
    public_base_url: String,
}

#[derive(Deserialize)]
struct CreateOrderResp {
    payment_session_id: Option<String>,
}

impl CashfreeClient {
    pub fn new(
        client_id: String,
        client_secret: String,
        env: CashfreeEnv,
        public_base_url: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            env,
            public_base_url,
        }
    }

    /// Create a payment order and derive its hosted-checkout URL.
    ///
    /// The delivery link travels as `order_note`, which the gateway stores
    /// and returns unmodified when the order is re-fetched later. No retry:
    /// the caller reports failures per item.
    pub async fn create_order(&self, order: &NewOrder) -> Result<CreatedOrder, OrderError> {
        let order_id = generate_order_id();

        let body = json!({
            "order_id": order_id,
            "order_amount": order.amount,
            "order_currency": "INR",
            "customer_details": {
                "customer_id": customer_id(&order.product_id),
                "customer_name": order.customer_name,
                "customer_email": order.customer_email,
                "customer_phone": order.customer_phone,
            },
            "order_meta": {
                "return_url": format!(
                    "{}/success?order_id={{order_id}}&product_id={}",
                    self.public_base_url, order.product_id
                ),
                "notify_url": format!("{}/api/webhook", self.public_base_url),
            },
            "order_note": order.telegram_link,
        });

        let resp = self
            .client
            .post(format!("{}/pg/orders", self.env.api_base()))
            .header("x-api-version", API_VERSION)
            .header("x-client-id", &self.client_id)
            .header("x-client-secret", &self.client_secret)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let details = resp.json::<Value>().await.ok();
            return Err(OrderError::Gateway {
                reason: format!("order creation returned {}", status),
                details,
            });
        }

        let parsed: CreateOrderResp = resp.json().await.map_err(|e| OrderError::Gateway {
            reason: format!("malformed order response: {}", e),
            details: None,
        })?;

        let session_id = parsed.payment_session_id.ok_or_else(|| OrderError::Gateway {
            reason: "response carried no payment_session_id".to_string(),
            details: None,
        })?;

        Ok(CreatedOrder {
            checkout_url: checkout_url(self.env, &session_id),
            order_id,
            payment_session_id: session_id,
            telegram_link: order.telegram_link.clone(),
        })
    }

    /// Re-fetch an order; used by the webhook consumer and the return page
    /// to recover the delivery link from `order_note`.
    pub async fn get_order(&self, order_id: &str) -> Result<OrderDetails, OrderError> {
        let resp = self
            .client
            .get(format!("{}/pg/orders/{}", self.env.api_base(), order_id))
            .header("x-api-version", API_VERSION)
            .header("x-client-id", &self.client_id)
            .header("x-client-secret", &self.client_secret)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let details = resp.json::<Value>().await.ok();
            return Err(OrderError::Gateway {
                reason: format!("order fetch returned {}", status),
                details,
            });
        }

        resp.json::<OrderDetails>().await.map_err(|e| OrderError::Gateway {
            reason: format!("malformed order response: {}", e),
            details: None,
        })
    }
}

/// Locally unique order id; uniqueness against the gateway is not verified.
fn generate_order_id() -> String {
    let suffix: u32 = rand::rng().random_range(0..1000);
    format!("ORDER_{}_{}", Utc::now().timestamp_millis(), suffix)
}

fn checkout_url(env: CashfreeEnv, session_id: &str) -> String {
    format!("{}/order/#{}", env.checkout_base(), session_id)
}

/// Product id for one purchase: leads with the chat id so the webhook can
/// recover the buyer identity.
pub fn product_id(chat_id: i64, item_key: &str) -> String {
    format!("{}_{}", chat_id, item_key)
}

pub fn customer_id(product_id: &str) -> String {
    format!("cust_{}", product_id)
}

/// Recover the buyer's chat id from a webhook `customer_id`.
pub fn buyer_chat_id(customer_id: &str) -> Option<i64> {
    customer_id
        .strip_prefix("cust_")?
        .split('_')
        .next()?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_has_time_and_random_suffix() {
        let id = generate_order_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts[0], "ORDER");
        assert!(parts[1].parse::<i64>().unwrap() > 0);
        assert!(parts[2].parse::<u32>().unwrap() < 1000);
    }

    #[test]
    fn checkout_url_embeds_session_id_per_environment() {
        assert_eq!(
            checkout_url(CashfreeEnv::Production, "session_abc"),
            "https://payments.cashfree.com/order/#session_abc"
        );
        assert_eq!(
            checkout_url(CashfreeEnv::Sandbox, "session_abc"),
            "https://payments-test.cashfree.com/order/#session_abc"
        );
    }

    #[test]
    fn buyer_chat_id_round_trips_through_customer_id() {
        let pid = product_id(123456789, "bio_mtg");
        assert_eq!(pid, "123456789_bio_mtg");
        assert_eq!(customer_id(&pid), "cust_123456789_bio_mtg");
        assert_eq!(buyer_chat_id(&customer_id(&pid)), Some(123456789));
    }

    #[test]
    fn buyer_chat_id_rejects_foreign_identifiers() {
        assert_eq!(buyer_chat_id("123_bio_mtg"), None);
        assert_eq!(buyer_chat_id("cust_notanumber_bio"), None);
        assert_eq!(buyer_chat_id("cust_"), None);
    }

    #[test]
    fn environment_hosts_differ() {
        assert!(CashfreeEnv::Production.api_base().contains("api.cashfree.com"));
        assert!(CashfreeEnv::Sandbox.api_base().contains("sandbox.cashfree.com"));
    }
}
