use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use patrimonio_api::{router, AppState};
use patrimonio_core::advisor::Advisor;
use patrimonio_core::datasets::DatasetRegistry;
use patrimonio_core::llm::anthropic::AnthropicClient;
use patrimonio_core::llm::{CompletionProvider, Unconfigured};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = patrimonio_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let datasets = DatasetRegistry::from_settings(&settings).inspect_err(|e| {
        sentry_anyhow::capture_anyhow(e);
    })?;

    let provider: Arc<dyn CompletionProvider> = match AnthropicClient::from_settings(&settings) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "completion provider unavailable; starting API with advisor in degraded mode");
            Arc::new(Unconfigured {
                reason: format!("{e:#}"),
            })
        }
    };
    let advisor = Advisor::from_env(provider);

    let state = AppState::new(datasets, advisor, &settings.site_base_url);
    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, data_dir = %settings.data_dir.display(), "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &patrimonio_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
