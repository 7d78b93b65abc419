use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use order_service::{routes, store::AppStore, Config};
use response_cache::{ReconnectPolicy, ResponseCache};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().map_err(anyhow::Error::msg)?;

    let cache = ResponseCache::connect(
        &config.cache.url,
        ReconnectPolicy {
            max_attempts: config.cache.max_reconnect_attempts,
        },
    )
    .await
    .context("failed to initialize response cache")?;

    let store = web::Data::new(AppStore::new());
    let cache_data = web::Data::from(cache.clone());
    let config_data = web::Data::new(config.clone());

    let bind_addr = (config.app.host.clone(), config.app.port);
    info!(
        host = %bind_addr.0,
        port = bind_addr.1,
        env = %config.app.env,
        "starting order-service"
    );

    let secret = config.auth.jwt_secret.clone();
    let food_list_ttl_secs = config.cache.food_list_ttl_secs;
    let allowed_origins = config.cors.allowed_origins.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(build_cors(&allowed_origins))
            .app_data(store.clone())
            .app_data(cache_data.clone())
            .app_data(config_data.clone())
            .configure(|cfg| routes::configure(cfg, &secret, cache.clone(), food_list_ttl_secs))
    })
    .bind(bind_addr)?
    .run()
    .await
    .context("server error")
}

fn build_cors(allowed_origins: &str) -> Cors {
    if allowed_origins.trim() == "*" {
        return Cors::permissive();
    }

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allow_any_header()
        .supports_credentials()
        .max_age(3600);
    for origin in allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
    {
        cors = cors.allowed_origin(origin);
    }
    cors
}
