mod telemetry;

use std::sync::Arc;

use anyhow::anyhow;
use aws_config::BehaviorVersion;
use tokio::sync::mpsc;

use techconf_core::Config;
use techconf_db::PgNotificationStore;
use techconf_worker::{NotificationHandler, QueueConsumer, QueueConsumerConfig, SqsMessageSource};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    telemetry::init_telemetry(config.log_format)
        .map_err(|e| anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        db_host = %config.database.host,
        db_name = %config.database.dbname,
        queue_url = %config.queue.queue_url,
        email_configured = config.email.is_some(),
        "Starting notification function"
    );

    if config.is_production()
        && matches!(
            config.database.ssl_mode.as_str(),
            "disable" | "allow" | "prefer"
        )
    {
        tracing::warn!(
            ssl_mode = %config.database.ssl_mode,
            "Database TLS is not enforced in production"
        );
    }

    let store = Arc::new(PgNotificationStore::new(config.database.clone()));
    let handler = Arc::new(NotificationHandler::new(store));

    let aws_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let source = Arc::new(SqsMessageSource::new(
        aws_sdk_sqs::Client::new(&aws_config),
        config.queue.clone(),
    ));

    let consumer = QueueConsumer::new(
        source,
        handler,
        QueueConsumerConfig::from(&config.queue),
    );

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(()).await;
    });

    consumer.run(shutdown_rx).await;

    tracing::info!("Notification function stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down after the current batch");
}
