use axum::{extract::State, http::StatusCode, Json};
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::utils::mailer::ContactMail;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub subject: String,
}

fn required_fields_present(req: &ContactRequest) -> bool {
    !req.name.trim().is_empty() && !req.email.trim().is_empty() && !req.message.trim().is_empty()
}

fn subject_line(req: &ContactRequest) -> String {
    let subject = req.subject.trim();
    if !subject.is_empty() {
        return subject.to_string();
    }
    let from = if req.company.trim().is_empty() {
        req.name.trim()
    } else {
        req.company.trim()
    };
    format!("New retailer inquiry from {}", from)
}

fn mail_body(req: &ContactRequest) -> String {
    let company = if req.company.trim().is_empty() {
        "Not specified"
    } else {
        req.company.trim()
    };
    format!(
        "From: {} ({})\nCompany: {}\n\n{}",
        req.name.trim(),
        req.email.trim(),
        company,
        req.message.trim()
    )
}

pub async fn send_contact(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContactRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    // 3 messages per minute per sender address
    let quota = Quota::per_minute(nonzero!(3u32));
    let limiter_key = req.email.trim().to_lowercase();
    let entry = state
        .contact_limiter
        .entry(limiter_key.clone())
        .or_insert_with(|| RateLimiter::keyed(quota));
    if entry.value().check_key(&limiter_key).is_err() {
        tracing::warn!("contact rate limit exceeded");
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": "Too many messages, please try again later"})),
        ));
    }
    drop(entry);

    if !required_fields_present(&req) {
        tracing::warn!("contact submission rejected: missing required fields");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing required fields: name, email, message"})),
        ));
    }

    let mailer = match &state.mailer {
        Some(mailer) => mailer.clone(),
        None => {
            tracing::error!("contact submission received but SMTP credentials are not configured");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Email service not configured"})),
            ));
        }
    };

    let mail = ContactMail {
        sender_name: req.name.trim().to_string(),
        sender_email: req.email.trim().to_string(),
        subject: subject_line(&req),
        body: mail_body(&req),
    };

    tracing::info!(subject = %mail.subject, "relaying contact submission");
    match mailer.send_contact(&mail) {
        Ok(()) => Ok(Json(json!({"message": "Email sent successfully"}))),
        Err(e) => {
            tracing::error!("failed to relay contact mail: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("Error sending email: {}", e)})),
            ))
        }
    }
}
