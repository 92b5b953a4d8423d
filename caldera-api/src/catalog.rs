use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use caldera_catalog::catalog::{DestinationQuery, PackageQuery};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppPath, AppQuery};
use crate::state::AppState;

const LIST_CACHE: &str = "s-maxage=60";
const DETAIL_CACHE: &str = "s-maxage=300";
const COMPOSITION_CACHE: &str = "s-maxage=600";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/catalog/destinations", get(list_destinations))
        .route("/catalog/destinations/{slug}", get(get_destination))
        .route("/catalog/packages", get(list_packages))
        .route("/catalog/packages/{slug}", get(get_package))
        .route("/catalog/packages/{id}/composition", get(get_package_composition))
}

/// GET /api/catalog/destinations
async fn list_destinations(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<DestinationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let list = state.catalog.list_destinations(query).await?;
    Ok(([(header::CACHE_CONTROL, LIST_CACHE)], Json(list)))
}

/// GET /api/catalog/destinations/{slug}
async fn get_destination(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<impl IntoResponse, AppError> {
    let destination = state.catalog.get_destination(&slug).await?;
    Ok(([(header::CACHE_CONTROL, DETAIL_CACHE)], Json(destination)))
}

/// GET /api/catalog/packages
async fn list_packages(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PackageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let list = state.catalog.list_packages(query).await?;
    Ok(([(header::CACHE_CONTROL, LIST_CACHE)], Json(list)))
}

/// GET /api/catalog/packages/{slug}
async fn get_package(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<impl IntoResponse, AppError> {
    let package = state.catalog.get_package(&slug).await?;
    Ok(([(header::CACHE_CONTROL, DETAIL_CACHE)], Json(package)))
}

/// GET /api/catalog/packages/{id}/composition
async fn get_package_composition(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let composition = state.catalog.get_package_composition(id).await?;
    Ok(([(header::CACHE_CONTROL, COMPOSITION_CACHE)], Json(composition)))
}
