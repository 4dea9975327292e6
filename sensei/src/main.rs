#![forbid(unsafe_code)]
#![warn(clippy::dbg_macro, clippy::use_debug, clippy::todo)]

use std::{sync::Arc, time::Duration};

use lib::{
    config, jwt::JwtSecret, redis::RedisConnection, services::Services, storage::BlobStorage,
    SharedState,
};
use poem::{listener::TcpListener, middleware::Tracing, post, EndpointExt, Route, Server};
use poem_ext::{db::DbTransactionMiddleware, panic_handler::PanicHandler};
use poem_openapi::OpenApiService;
use sea_orm::{ConnectOptions, Database};
use tracing::info;

use crate::endpoints::{get_api, webhook::telegram_webhook};

mod endpoints;
mod schemas;
mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    info!("Loading config");
    let config = Arc::new(config::load()?);

    let _sentry_guard = config.sentry.as_ref().map(|sentry| {
        sentry::init((
            sentry.dsn.to_string(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    info!("Connecting to database");
    let mut db_options = ConnectOptions::new(config.database.url.to_string());
    db_options.connect_timeout(Duration::from_secs(config.database.connect_timeout));
    let db = Database::connect(db_options).await?;

    info!("Connecting to redis");
    let auth_redis = RedisConnection::new(config.redis.auth.as_str()).await?;

    let jwt_secret = JwtSecret::try_from(config.jwt_secret.as_str())?;
    let services = Services::from_config(&config);
    let storage = BlobStorage::new(config.storage.root.clone());
    let shared_state = Arc::new(SharedState {
        jwt_secret: jwt_secret.clone(),
        auth_redis: auth_redis.clone(),
        services,
        storage,
        db: db.clone(),
    });

    let api_service = OpenApiService::new(
        get_api(shared_state.clone()),
        "AI Sensei Backend: Lessons Microservice",
        env!("CARGO_PKG_VERSION"),
    )
    .external_document("/openapi.json")
    .server(config.sensei.server.to_string());
    let app = Route::new()
        .nest("/openapi.json", api_service.spec_endpoint())
        .nest("/docs", api_service.swagger_ui())
        .nest("/redoc", api_service.redoc())
        .at("/webhook/telegram", post(telegram_webhook))
        .nest("/", api_service)
        .with(Tracing)
        .with(PanicHandler::middleware())
        .with(DbTransactionMiddleware::new(db))
        .data(shared_state)
        .data(jwt_secret)
        .data(auth_redis);

    info!(
        "Listening on {}:{}",
        config.sensei.host, config.sensei.port
    );
    Server::new(TcpListener::bind((
        config.sensei.host.as_str(),
        config.sensei.port,
    )))
    .run(app)
    .await?;

    Ok(())
}
