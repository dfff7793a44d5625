use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use winbot_core::{
    config::Config, content::ContentSelector, flow::Conversation,
    messaging::port::MessagingPort, store::SendRecordStore,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub conversation: Arc<Conversation>,
}

/// Clear queued updates, then long-poll until Ctrl-C.
pub async fn run_polling(
    cfg: Arc<Config>,
    store: Arc<dyn SendRecordStore>,
    selector: Arc<ContentSelector>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_token.clone());

    // Basic startup info.
    match bot.get_me().await {
        Ok(me) => info!("winbot started: @{}", me.username()),
        Err(e) => warn!("getMe failed: {e}"),
    }

    if cfg.drop_pending_updates {
        bot.delete_webhook().drop_pending_updates(true).await?;
        info!("pending updates dropped");
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let conversation = Arc::new(Conversation::new(cfg, store, messenger, selector));
    let state = Arc::new(AppState { conversation });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("dispatcher stopped");
    Ok(())
}
