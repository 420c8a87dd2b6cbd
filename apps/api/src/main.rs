use actix_web::{web, App, HttpServer};
use roster_api::config::db::DbProfile;
use roster_api::infra::state::build_state;
use roster_api::middleware::cors::cors_middleware;
use roster_api::middleware::request_trace::RequestTrace;
use roster_api::middleware::structured_logger::StructuredLogger;
use roster_api::routes;
use roster_api::state::security_config::SecurityConfig;
use roster_api::telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment
    // (docker env_file, or source an env file for local dev).
    let host = std::env::var("ROSTER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("ROSTER_PORT")
        .unwrap_or_else(|_| "8000".to_string())
        .parse::<u16>()
        .unwrap_or_else(|_| {
            eprintln!("ROSTER_PORT must be a valid port number");
            std::process::exit(1);
        });

    let jwt = match std::env::var("ROSTER_JWT_SECRET") {
        Ok(jwt) => jwt,
        Err(_) => {
            eprintln!("ROSTER_JWT_SECRET must be set");
            std::process::exit(1);
        }
    };
    let security_config = SecurityConfig::new(jwt.as_bytes());

    let app_state = match build_state()
        .with_db(DbProfile::Prod)
        .with_security(security_config)
        .build()
        .await
    {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(host = %host, port, "starting roster-api");

    let data = web::Data::new(app_state);

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .wrap(StructuredLogger)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
