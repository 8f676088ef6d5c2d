use askama::Template;
use axum::{
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse},
};
use serde::Deserialize;
use tracing::error;

#[derive(Template)]
#[template(path = "success.html")]
struct SuccessTemplate {
    order_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SuccessParams {
    pub order_id: Option<String>,
}

/// Checkout return page: fetches the order's delivery link client-side and
/// redirects to it, with a manual-contact fallback.
pub async fn success_page(Query(params): Query<SuccessParams>) -> impl IntoResponse {
    let template = SuccessTemplate {
        order_id: params.order_id.unwrap_or_default(),
    };

    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render success page: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
