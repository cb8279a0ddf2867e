use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

mod api;
mod auth;
mod clock;
mod config;
mod db;
mod docs;
mod geo;
mod model;
mod routes;
mod service;
mod store;

use auth::jwt::TokenCodec;
use clock::SystemClock;
use config::Config;
use db::init_db;
use service::session::SessionTtl;
use service::{AttendanceSvc, SessionSvc};
use store::mysql::MySqlStore;

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "geoattend"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    let store = MySqlStore::new(pool);
    let codec = TokenCodec::new(&config.jwt_secret);

    let sessions = Data::new(SessionSvc::new(
        store.clone(),
        codec.clone(),
        SystemClock,
        SessionTtl::from_config(&config),
    ));
    let attendance = Data::new(AttendanceSvc::new(
        store.clone(),
        SystemClock,
        config.utc_offset,
    ));
    let store = Data::new(store);
    let codec = Data::new(codec);

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store.clone())
            .app_data(codec.clone())
            .app_data(config_data.clone())
            .app_data(sessions.clone())
            .app_data(attendance.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
