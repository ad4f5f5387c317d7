use dotenvy::dotenv;
use receipt_ledger_bot::bot::{AppState, webhook};
use receipt_ledger_bot::clients::MessagingClient;
use receipt_ledger_bot::clients::ledger::HttpLedgerSink;
use receipt_ledger_bot::clients::line::LineClient;
use receipt_ledger_bot::clients::ocr::AzureReceiptAnalyzer;
use receipt_ledger_bot::clients::queue::DbJobQueue;
use receipt_ledger_bot::config::{self, AppConfig};
use receipt_ledger_bot::core::dialog::DialogOrchestrator;
use receipt_ledger_bot::core::ttl;
use receipt_ledger_bot::core::worker::AnalysisWorker;
use receipt_ledger_bot::errors::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const TTL_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenv().ok();
    let app_config = AppConfig::from_env()?;

    let db = config::database::create_connection(&app_config.database_url).await?;
    config::database::create_tables(&db).await?;
    info!("Database initialized successfully.");

    let classifications = config::classifications::load_config(&app_config.classifications_path)?;
    config::database::seed_classifications(&db, &classifications.classifications).await?;
    info!("Classification seed processed.");

    let messaging: Arc<dyn MessagingClient> =
        Arc::new(LineClient::new(&app_config.channel_access_token)?);
    let analyzer = Arc::new(AzureReceiptAnalyzer::new(
        &app_config.ocr_endpoint,
        &app_config.ocr_api_key,
        &app_config.ocr_api_version,
    )?);
    let ledger = Arc::new(HttpLedgerSink::new(
        &app_config.ledger_endpoint,
        &app_config.ledger_token,
    )?);
    let queue = DbJobQueue::new(db.clone());

    let dialog = Arc::new(DialogOrchestrator::new(
        db.clone(),
        Arc::clone(&messaging),
        ledger,
        Arc::new(queue.clone()),
    ));
    let worker = AnalysisWorker::new(db.clone(), Arc::clone(&messaging), analyzer);

    spawn_worker_loop(
        worker,
        queue,
        app_config.worker_poll_secs,
        app_config.worker_max_attempts,
    );
    spawn_ttl_sweeper(db.clone());

    let state = AppState {
        dialog,
        messaging,
        channel_secret: app_config.channel_secret.clone(),
    };
    let listener = tokio::net::TcpListener::bind(&app_config.bind_address)
        .await
        .map_err(Error::Io)?;
    info!(address = %app_config.bind_address, "webhook server listening");
    axum::serve(listener, webhook::router(state))
        .await
        .map_err(Error::Io)?;
    Ok(())
}

/// Polls the job queue and runs analysis jobs one at a time. Jobs past the
/// attempt limit are dropped instead of redelivered forever.
fn spawn_worker_loop(
    worker: AnalysisWorker,
    queue: DbJobQueue,
    poll_secs: u64,
    max_attempts: i32,
) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(poll_secs));
        loop {
            tick.tick().await;
            loop {
                let job = match queue.next_due().await {
                    Ok(Some(job)) => job,
                    Ok(None) => break,
                    Err(err) => {
                        error!(error = %err, "queue poll failed");
                        break;
                    }
                };
                if job.attempts > max_attempts {
                    error!(draft = %job.draft_id, attempts = job.attempts, "job dropped");
                    if let Err(err) = queue.ack(job.id).await {
                        error!(error = %err, "dropping exhausted job failed");
                    }
                    continue;
                }
                if worker.process(&job.draft_id).await {
                    if let Err(err) = queue.ack(job.id).await {
                        error!(error = %err, "job acknowledgement failed");
                    }
                }
            }
        }
    });
}

/// Periodically reclaims rows past their expiry timestamp.
fn spawn_ttl_sweeper(db: sea_orm::DatabaseConnection) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(TTL_SWEEP_INTERVAL);
        loop {
            tick.tick().await;
            if let Err(err) = ttl::purge_expired(&db).await {
                warn!(error = %err, "expiry sweep failed");
            }
        }
    });
}
