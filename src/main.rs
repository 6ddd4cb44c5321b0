use std::sync::Arc;

use calculadora_cme::config::CalculatorConfig;
use calculadora_cme::routes::wizard_routes;
use calculadora_cme::wizard::{SessionStore, spawn_expiry_task};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = CalculatorConfig::from_env();

    eprintln!("Calculadora CME v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.backend_url);
    eprintln!("   CEP lookup: {}", config.cep_url);
    eprintln!("   Wizard API: http://0.0.0.0:{}/api/wizard", config.bind_port);

    let sessions = SessionStore::from_config(&config)?;
    let _expiry = spawn_expiry_task(Arc::clone(&sessions));
    let app = wizard_routes(sessions, &config);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.bind_port)).await?;
    tracing::info!(port = config.bind_port, "Wizard server started");
    axum::serve(listener, app).await?;

    Ok(())
}
