//! Main entry point for the Napali permit watcher.
//! Checks the Kalalau permit listing on a fixed interval and texts recipients when permits open up.

mod scheduler;

use std::sync::Arc;

use notification_services::{SsmSecretStore, TwilioSmsService};
use permit_scan::{
    EhawaiiClient, KnownStateStore, MemoryKnownStateStore, MockSmsService, NotificationDispatcher,
    PermitChecker, SecretNames, SmsService, StoreBackend, WatcherConfig,
};
use postgres::database::*;

use crate::scheduler::CheckScheduler;

async fn build_store(config: &WatcherConfig) -> anyhow::Result<Arc<dyn KnownStateStore>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let pool = match create_connection_pool(&config.database_url).await {
                Ok(pool) => {
                    log::info!("🗃️ Database pool created successfully");

                    if let Err(e) = test_connection(&pool).await {
                        log::error!("❌ Database connection test failed: {}", e);
                    }
                    pool
                }
                Err(e) => {
                    log::error!("❌ Failed to create database pool: {}", e);
                    log::error!(
                        "💡 Check DATABASE_URL or set STORE_BACKEND=memory for a local run"
                    );
                    return Err(e.into());
                }
            };

            let store = PgKnownStateStore::new(pool, &config.table_name)?;
            store.ensure_table().await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            log::warn!("🧠 Using in-memory known availability; state is lost on exit");
            Ok(Arc::new(MemoryKnownStateStore::new()))
        }
    }
}

fn build_sms_service(config: &WatcherConfig) -> anyhow::Result<Arc<dyn SmsService>> {
    if config.dry_run {
        log::warn!("🔧 NOTIFY_DRY_RUN is set, alerts will only be logged");
        return Ok(Arc::new(MockSmsService));
    }

    Ok(Arc::new(TwilioSmsService::new()?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting Napali permit watcher...");

    let config = WatcherConfig::from_env()?;
    log::info!(
        "🏕️ Watching {} at site {} for {} days",
        config.campsite_name,
        config.site_id,
        config.days_to_search
    );

    let store = build_store(&config).await?;

    let secret_store = Arc::new(SsmSecretStore::new().await);
    let dispatcher = NotificationDispatcher::new(
        secret_store,
        build_sms_service(&config)?,
        SecretNames::with_prefix(&config.secret_prefix),
    );

    let source = Arc::new(EhawaiiClient::new(
        &config.source_base_url,
        config.site_id,
        config.days_to_search,
    )?);

    let schedule = config.schedule.clone();
    let checker = Arc::new(PermitChecker::new(config, source, store, dispatcher));
    let scheduler = CheckScheduler::new(checker, schedule.clone());

    if schedule.run_once {
        let outcome = scheduler.run_once().await?;
        log::info!("✅ Check finished: {:?}", outcome);
        return Ok(());
    }

    let checks = scheduler
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("❌ Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    log::info!("👋 Stopped after {} checks", checks);
    Ok(())
}
