use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use studiobook::config::AppConfig;
use studiobook::db;
use studiobook::handlers;
use studiobook::services::mail::http::HttpMailer;
use studiobook::services::mail::{LogMailer, Mailer};
use studiobook::services::messaging::twilio::TwilioWhatsAppProvider;
use studiobook::services::messaging::{LogMessenger, MessagingProvider};
use studiobook::services::notify::Notifier;
use studiobook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db_with_timeout(&config.database_url, config.store_timeout())?;

    let mailer: Arc<dyn Mailer> = if config.mail_configured() {
        tracing::info!(url = %config.mail_api_url, "using HTTP mail API");
        Arc::new(HttpMailer::new(
            config.mail_api_url.clone(),
            config.mail_api_key.clone(),
            config.mail_from.clone(),
        ))
    } else {
        tracing::warn!("MAIL_API_URL/MAIL_FROM not set, email notices will only be logged");
        Arc::new(LogMailer)
    };

    let messenger: Arc<dyn MessagingProvider> = if config.whatsapp_configured() {
        tracing::info!("using Twilio WhatsApp provider");
        Arc::new(TwilioWhatsAppProvider::new(
            config.twilio_account_sid.clone(),
            config.twilio_auth_token.clone(),
            config.twilio_whatsapp_from.clone(),
        ))
    } else {
        Arc::new(LogMessenger)
    };

    if config.admin_token == "changeme" {
        tracing::warn!("ADMIN_TOKEN is the default value, set it before exposing the service");
    }

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        notifier: Notifier::new(mailer, messenger, config.studio_name.clone()),
        config: config.clone(),
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
