use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use crumble_api::app::{AppServices, build_app};
use crumble_api::config::{FrontDoorConfig, Settings, TlsMaterial};
use crumble_api::server::FrontDoor;
use crumble_store::{InMemoryUserStore, PgUserStore, UserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    crumble_observability::init();

    let settings = Settings::from_env()?;

    let store: Arc<dyn UserStore> = match &settings.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await?;
            let store = PgUserStore::new(pool);
            store.migrate().await?;
            tracing::info!("using postgres user store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; user records are in-memory only");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let services = Arc::new(AppServices::new(
        store,
        settings.token_secret.as_bytes(),
        ChronoDuration::seconds(settings.session_ttl_secs),
    ));

    let tls = TlsMaterial::from_files(&settings.tls_cert_path, &settings.tls_key_path)?;
    let front_door = FrontDoor::new();
    front_door
        .start(FrontDoorConfig {
            http_addr: settings.http_addr,
            https_addr: settings.https_addr,
            tls,
            routes: build_app(services),
        })
        .await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    front_door.stop().await?;

    Ok(())
}
