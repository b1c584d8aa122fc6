//! Main entry point for the YelpCamp backend server.
//! Serves the JSON API and, when present, the frontend build.

mod config;
mod container;
mod cors;
mod error_details;

use std::path::Path;

use actix_files::Files;
use actix_web::{App, HttpServer, middleware::Condition, middleware::Logger, web};
use anyhow::Context;

use auth_services::{AuthMiddleware, JwtService};
use postgres::{create_connection_pool, run_migrations};
use web_handlers::{configure, not_found, security_headers};

use config::AppConfig;
use error_details::ErrorDetails;

fn frontend_dir(config: &AppConfig) -> Option<String> {
    let dir = config.frontend_dir.as_deref()?;
    if Path::new(dir).is_dir() {
        log::info!("📁 Serving frontend files from {}", dir);
        Some(dir.to_string())
    } else {
        log::warn!("Frontend directory {} not found, serving the API only", dir);
        None
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env()?;

    log::info!("🚀 Starting YelpCamp server in {} mode...", config.environment.as_str());
    log::debug!("{:?}", config);

    let pool = create_connection_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;
    log::info!("🗃️ Database pool created successfully");

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let state = web::Data::new(container::build_state(&config, pool)?);
    let jwt_service = JwtService::new(&config.jwt_secret);
    let frontend_dir = frontend_dir(&config);
    let development = config.is_development();
    let frontend_url = config.frontend_url.clone();

    log::info!("🌐 Server will be available at: http://0.0.0.0:{}", config.port);

    HttpServer::new(move || {
        let app = App::new()
            .app_data(state.clone())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(Condition::new(development, ErrorDetails))
            .wrap(security_headers())
            .wrap(cors::cors(frontend_url.as_deref()))
            .wrap(Logger::default())
            .configure(configure);

        match &frontend_dir {
            Some(dir) => app.service(
                Files::new("/", dir)
                    .index_file("index.html")
                    .default_handler(web::to(not_found)),
            ),
            None => app.default_service(web::to(not_found)),
        }
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await?;

    Ok(())
}
