use actix_web::{web, App, HttpServer};
use actix_cors::Cors;
use buzzer_server::{health_check, join_info, state_snapshot, AppError, AppState, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[actix_web::main]
async fn main() -> buzzer_server::Result<()> {
    dotenv().ok();

    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();

    let config = Settings::new()?;
    info!("Configuration loaded successfully ({})", config.environment);

    let state = AppState::new(config.clone());

    let ws_listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        config.websocket.host, config.websocket.port
    ))
    .await?;
    info!(
        "WebSocket server ready at ws://{}:{} (participants join via {})",
        config.websocket.host,
        config.websocket.port,
        config.join_url()
    );
    let ws_server = state.ws_server.clone();
    tokio::spawn(async move {
        if let Err(e) = ws_server.serve(ws_listener).await {
            error!("WebSocket server stopped: {}", e);
        }
    });

    let state = web::Data::new(state);
    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Starting HTTP server at {}:{}", config.server.host, config.server.port);

    let workers = config.server.workers as usize;
    let cors_settings = config.cors.clone();

    HttpServer::new(move || {
        let cors = if cors_settings.enabled {
            let cors_config = if cors_settings.allow_any_origin {
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
            } else {
                Cors::default()
                    .allowed_origin("http://localhost:8080")
                    .allowed_origin("http://127.0.0.1:8080")
                    .allowed_methods(vec!["GET"])
            };
            cors_config.max_age(cors_settings.max_age as usize)
        } else {
            Cors::default()
        };

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .route("/health", web::get().to(health_check))
            .route("/state", web::get().to(state_snapshot))
            .route("/join", web::get().to(join_info))
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(())
}
