use std::sync::Arc;

use tracing::{error, info, warn};

use winbot_core::{
    clock::ZonedClock, config::Config, content::ContentSelector, store::SqliteSendStore,
};

mod liveness;

#[tokio::main]
async fn main() -> Result<(), winbot_core::Error> {
    winbot_core::logging::init("winbot")?;

    let cfg = Arc::new(Config::load()?);
    info!(
        photo_folder = %cfg.photo_folder.display(),
        db_path = %cfg.db_path.display(),
        timezone = %cfg.timezone,
        channel_id = cfg.channel_id.0,
        "config loaded"
    );

    let selector = Arc::new(ContentSelector::with_default_captions(
        cfg.photo_folder.clone(),
    )?);
    let pool_size = selector.pool().len();
    if pool_size == 0 {
        warn!(folder = %cfg.photo_folder.display(), "photo folder has no images yet");
    } else {
        info!(images = pool_size, "photo pool ready");
    }

    let clock = Arc::new(ZonedClock::new(cfg.timezone));
    let store = Arc::new(SqliteSendStore::open(&cfg.db_path, clock).await?);

    let port = cfg.port;
    tokio::spawn(async move {
        if let Err(e) = liveness::serve(port).await {
            error!("liveness endpoint failed: {e}");
        }
    });

    winbot_telegram::router::run_polling(cfg, store.clone(), selector)
        .await
        .map_err(|e| winbot_core::Error::External(format!("telegram bot failed: {e}")))?;

    store.close().await;
    Ok(())
}
