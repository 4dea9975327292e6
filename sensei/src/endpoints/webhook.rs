use std::sync::Arc;

use lib::SharedState;
use poem::{handler, web::Data, Body};
use poem_ext::db::DbTxn;
use tracing::error;

use crate::services::bot::{self, TelegramUpdate};

/// Inbound Telegram webhook.
///
/// Always answers 200 so the Bot API does not retry: malformed or empty
/// bodies are acknowledged, and processing failures are logged and
/// swallowed. Only POST is routed here; other methods get 405 from the
/// router.
#[handler]
pub async fn telegram_webhook(
    state: Data<&Arc<SharedState>>,
    db: Data<&DbTxn>,
    body: Body,
) -> &'static str {
    let update = match body.into_vec().await {
        Ok(bytes) => match serde_json::from_slice::<TelegramUpdate>(&bytes) {
            Ok(update) => update,
            Err(_) => return "OK",
        },
        Err(_) => return "OK",
    };

    if let Err(err) = bot::process_update(&state.services, &db, update).await {
        error!("could not process telegram update: {err}");
    }
    "OK"
}
