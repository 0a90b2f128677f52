use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use sms_relay::channels::{CliSource, HttpSource, SourceManager};
use sms_relay::config::RelayConfig;
use sms_relay::pipeline::{self, classifier::Classifier, dispatcher::Dispatcher, forwarder::Forwarder};
use sms_relay::store::{CredentialStore, FileCredentialStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let config = RelayConfig::from_env();

    // Initialize tracing; keep the guard alive so buffered file logs flush on exit
    let _log_guard = init_tracing(&config);

    eprintln!("📨 SMS Relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Endpoint: {}", config.forwarder.endpoint_url);
    eprintln!("   Credential store: {}", config.store_path.display());
    eprintln!("   Storage key: {}", config.forwarder.storage_key);
    eprintln!(
        "   Max concurrent forwards: {}",
        config.dispatch.max_concurrent_forwards
    );

    // ── Forwarder ────────────────────────────────────────────────────────
    let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(&config.store_path));
    if store.get_token(&config.forwarder.storage_key).is_none() {
        eprintln!("   Warning: no credential stored yet; forwards will be skipped until linked");
    }
    let forwarder = Arc::new(
        Forwarder::new(&config.forwarder, store).context("Invalid forwarder configuration")?,
    );
    let dispatcher = Dispatcher::new(Classifier::default(), forwarder, &config.dispatch)?;

    // Log every completed attempt at the end of the pipeline
    let mut reports = dispatcher.subscribe();
    tokio::spawn(async move {
        loop {
            match reports.recv().await {
                Ok(report) => tracing::debug!(
                    dispatch_id = %report.dispatch_id,
                    outcome = report.outcome().map(|o| o.label()).unwrap_or("aborted"),
                    "Forward report"
                ),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(missed = n, "Report listener lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // ── Sources ──────────────────────────────────────────────────────────
    let mut sources = SourceManager::new();

    if let Some(port) = config.ingest_port {
        let http_source = HttpSource::new();
        let app = http_source.router();
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
            .await
            .with_context(|| format!("Failed to bind ingest port {port}"))?;
        tokio::spawn(async move {
            tracing::info!(port, "HTTP ingest server started");
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "HTTP ingest server stopped");
            }
        });
        sources.add(Box::new(http_source));
        eprintln!("   HTTP ingest: http://0.0.0.0:{}/api/messages", port);
    }

    if config.stdin_enabled {
        sources.add(Box::new(CliSource::new()));
        eprintln!("   Stdin: enabled (one SENDER|body per line)");
    }

    if sources.is_empty() {
        anyhow::bail!("No message sources enabled; set SMS_RELAY_INGEST_PORT or SMS_RELAY_STDIN");
    }
    eprintln!("   Sources: {}\n", sources.names().join(", "));

    let messages = sources.start_all().await?;
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    pipeline::run(messages, &dispatcher, shutdown).await;
    sources.shutdown_all().await;

    Ok(())
}

/// Stderr logging, plus a daily rolling file when a log directory is set.
fn init_tracing(config: &RelayConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "sms-relay.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}
