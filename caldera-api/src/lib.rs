use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod catalog;
pub mod error;
pub mod extract;
pub mod health;
pub mod mailer;
pub mod metrics;
pub mod reviews;
pub mod state;
pub mod webhooks;

pub use state::{Adapters, AppState};

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(health::routes())
        .merge(catalog::routes())
        .merge(bookings::routes())
        .merge(reviews::routes())
        .merge(webhooks::routes())
        .merge(mailer::routes());

    Router::new()
        .nest("/api", api)
        .route("/metrics", get(metrics::export))
        .layer(cors(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors(state: &AppState) -> CorsLayer {
    let origin = match state.allowed_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::list([origin]),
        Some(Err(_)) => {
            tracing::warn!("server.base_url is not a valid origin, CORS will reject cross-origin calls");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::USER_AGENT,
        ])
}
