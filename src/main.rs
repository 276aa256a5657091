use anyhow::Context;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware;
use souq_api::config::{init_tracing, load_config, AppConfig};
use souq_api::db::{establish_connection_from_app_config, run_migrations};
use souq_api::events::{process_events, EventSender};
use souq_api::rate_limiter::{
    rate_limit_middleware, start_cleanup_task, RateLimitConfig, RateLimiter,
};
use souq_api::{api_v1_routes, openapi, root_routes, AppState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Request headers allowed through CORS: the fixed content headers plus the
/// configured auth and API key header names.
fn cors_allow_headers(config: &AppConfig) -> Vec<HeaderName> {
    let mut headers = vec![header::CONTENT_TYPE, header::ACCEPT];
    for name in [&config.auth_header_name, &config.api_key_header_name] {
        match name.parse::<HeaderName>() {
            Ok(parsed) => {
                if !headers.contains(&parsed) {
                    headers.push(parsed);
                }
            }
            Err(_) => warn!("Ignoring invalid configured header name: {}", name),
        }
    }
    headers
}

/// CORS policy from configuration: explicit origins when configured,
/// permissive only in development or when explicitly opted in.
fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = cors_allow_headers(config);

    if config.has_cors_allowed_origins() {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter_map(|origin| {
                let origin = origin.trim();
                if origin.is_empty() {
                    return None;
                }
                match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin: {}", origin);
                        None
                    }
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
    } else if config.should_allow_permissive_cors() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers)
    } else {
        // No origins configured outside development: same-origin only
        CorsLayer::new()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    init_tracing(&config.log_level, config.log_json);

    info!(
        "Starting {} v{} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    let db = establish_connection_from_app_config(&config)
        .await
        .context("failed to connect to database")?;
    let db = Arc::new(db);

    if config.auto_migrate {
        run_migrations(&db).await.context("migrations failed")?;
    }

    let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity);
    tokio::spawn(process_events(event_rx));
    let event_sender = Arc::new(EventSender::new(event_tx));

    let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::from(&config)));
    tokio::spawn(start_cleanup_task(
        rate_limiter.clone(),
        Duration::from_secs(config.rate_limit_window_seconds.max(1)),
    ));

    let cors = build_cors_layer(&config);
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(db, config, event_sender));

    let app = root_routes()
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        config::Config::builder()
            .set_default("database_url", "sqlite::memory:")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn configured_auth_headers_are_cors_allowed() {
        let headers = cors_allow_headers(&test_config());
        assert!(headers.contains(&header::CONTENT_TYPE));
        assert!(headers.contains(&header::AUTHORIZATION));
        assert!(headers.iter().any(|h| h.as_str() == "x-api-key"));
    }

    #[test]
    fn invalid_configured_header_names_are_skipped() {
        let mut cfg = test_config();
        cfg.auth_header_name = "not a header\n".into();
        let headers = cors_allow_headers(&cfg);
        assert!(headers.iter().any(|h| h.as_str() == "x-api-key"));
        assert_eq!(headers.len(), 3);
    }
}
