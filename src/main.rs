use std::io;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use sharebill::{
    client::ApiClient,
    server::{self, AppState},
    settings::Settings,
};

#[derive(Debug, Parser)]
#[command(name = "sharebill")]
struct Args {
    /// Settings file (TOML). Defaults to an optional `settings.toml`.
    #[arg(long, env = "SHAREBILL_CONFIG")]
    config: Option<String>,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    let settings = Settings::new(args.config.as_deref()).map_err(io::Error::other)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("sharebill={}", settings.app.level))
        .init();

    let client = ApiClient::new(&settings.backend.base_url).map_err(io::Error::other)?;
    tracing::info!("Using backend {}", client.base_url());

    let state = web::Data::new(AppState {
        client,
        recompute_balances: settings.dashboard.recompute_balances,
    });
    let allowed_origin = settings.cors.allowed_origin.clone();

    tracing::info!("Listening on {}:{}", settings.server.bind, settings.server.port);
    HttpServer::new(move || {
        let cors = match &allowed_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .supports_credentials(),
            None => Cors::permissive(),
        };
        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(server::configure)
    })
    .bind((settings.server.bind.as_str(), settings.server.port))?
    .run()
    .await
}
