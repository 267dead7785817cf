//! # HTTP Server
//!
//! Combines the API and health routers behind CORS and a request body
//! limit. Rejections from the limit and from method routing are rendered
//! in the error envelope.

use axum::middleware;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use super::config::HttpServerConfig;
use super::routes::{api_routes, envelope_errors, health_routes, route_not_found};
use crate::app::App;
use crate::observability::Logger;

pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, app: &App) -> Self {
        let router = Self::build_router(&config, app);
        Self { config, router }
    }

    fn build_router(config: &HttpServerConfig, app: &App) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(health_routes())
            .merge(api_routes(app))
            .fallback(route_not_found)
            .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
            .layer(middleware::from_fn_with_state(config.body_limit_bytes, envelope_errors))
            .layer(cors)
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    pub async fn start(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        let addr = listener.local_addr()?.to_string();

        Logger::info("SERVER_LISTENING", &[("addr", addr.as_str())]);

        axum::serve(listener, self.router).await
    }
}
