use axum::{
    routing::{get, post},
    Router,
};
use dashmap::DashMap;
use dotenvy::dotenv;
use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, RateLimiter};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

mod handlers {
    pub mod contact_handlers;
}
mod utils {
    pub mod mailer;
}

use handlers::contact_handlers;
use utils::mailer::{MailTransport, SmtpMailer};

pub struct AppState {
    pub mailer: Option<Arc<dyn MailTransport>>,
    pub contact_limiter:
        DashMap<String, RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>>,
}

async fn health_check() -> &'static str {
    "OK"
}

fn app(state: Arc<AppState>) -> Router {
    let frontend_url =
        std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/contact", post(contact_handlers::send_contact))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_origin(AllowOrigin::exact(
                    frontend_url.parse().expect("Invalid FRONTEND_URL"),
                ))
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                    axum::http::header::ORIGIN,
                ]),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    use tracing_subscriber::{fmt, EnvFilter};
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,backend=debug"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let mailer = match SmtpMailer::from_env() {
        Some(mailer) => Some(Arc::new(mailer) as Arc<dyn MailTransport>),
        None => {
            tracing::warn!(
                "SMTP_HOST/SMTP_USERNAME/SMTP_PASSWORD not set, contact relay will answer 500"
            );
            None
        }
    };
    let state = Arc::new(AppState {
        mailer,
        contact_limiter: DashMap::new(),
    });

    let app = app(state);

    use tokio::net::TcpListener;
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    tracing::info!("Starting server on port {}", port);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await.unwrap();
    axum::serve(listener, app.into_make_service()).await.unwrap();
}
