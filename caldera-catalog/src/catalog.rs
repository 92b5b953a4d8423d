use std::sync::Arc;

use caldera_core::catalog::{Destination, DestinationFilter, Package, PackageFilter, PackageItem};
use caldera_core::repository::CatalogRepository;
use caldera_core::{CoreError, CoreResult, Money};
use caldera_shared::{PageMeta, PageRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationQuery {
    pub q: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub featured: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageQuery {
    pub q: Option<String>,
    pub destination_id: Option<Uuid>,
    pub category: Option<String>,
    pub luxury: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub duration_min: Option<u32>,
    pub duration_max: Option<u32>,
    pub featured: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DestinationList {
    pub destinations: Vec<Destination>,
    #[serde(flatten)]
    pub page: PageMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageList {
    pub packages: Vec<Package>,
    #[serde(flatten)]
    pub page: PageMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageComposition {
    pub package_id: Uuid,
    pub items: Vec<PackageItem>,
}

/// Read side of the catalog: published destinations and packages.
pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_destinations(&self, query: DestinationQuery) -> CoreResult<DestinationList> {
        let page = PageRequest::from_parts(query.limit, query.offset).map_err(CoreError::ValidationError)?;
        let filter = DestinationFilter {
            q: non_empty(query.q),
            country: non_empty(query.country),
            region: non_empty(query.region),
            featured: query.featured,
        };

        let (destinations, page) = self.repo.list_destinations(&filter, page).await?;
        tracing::debug!(count = destinations.len(), total = page.total, "listed destinations");
        Ok(DestinationList { destinations, page })
    }

    pub async fn get_destination(&self, slug: &str) -> CoreResult<Destination> {
        self.repo
            .find_destination(slug)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Destination with slug '{slug}' not found")))
    }

    pub async fn list_packages(&self, query: PackageQuery) -> CoreResult<PackageList> {
        let page = PageRequest::from_parts(query.limit, query.offset).map_err(CoreError::ValidationError)?;
        let filter = package_filter(&query)?;

        let (packages, page) = self.repo.list_packages(&filter, page).await?;
        tracing::debug!(count = packages.len(), total = page.total, "listed packages");
        Ok(PackageList { packages, page })
    }

    pub async fn get_package(&self, slug: &str) -> CoreResult<Package> {
        self.repo
            .find_package(slug)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Package with slug '{slug}' not found")))
    }

    pub async fn get_package_composition(&self, package_id: Uuid) -> CoreResult<PackageComposition> {
        let package = self
            .repo
            .find_published_package(package_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Package with ID '{package_id}' not found")))?;

        let items = self.repo.list_package_items(package.id).await?;
        Ok(PackageComposition {
            package_id: package.id,
            items,
        })
    }
}

fn package_filter(query: &PackageQuery) -> CoreResult<PackageFilter> {
    let min_price = price_bound("minPrice", query.min_price)?;
    let max_price = price_bound("maxPrice", query.max_price)?;

    if let (Some(min), Some(max)) = (min_price, max_price) {
        if min > max {
            return Err(CoreError::ValidationError(
                "minPrice must not exceed maxPrice".to_string(),
            ));
        }
    }
    for (name, value) in [("durationMin", query.duration_min), ("durationMax", query.duration_max)] {
        match value {
            Some(0) => return Err(CoreError::ValidationError(format!("{name} must be positive"))),
            Some(days) if i32::try_from(days).is_err() => {
                return Err(CoreError::ValidationError(format!("{name} is out of range")))
            }
            _ => {}
        }
    }
    if let (Some(min), Some(max)) = (query.duration_min, query.duration_max) {
        if min > max {
            return Err(CoreError::ValidationError(
                "durationMin must not exceed durationMax".to_string(),
            ));
        }
    }

    Ok(PackageFilter {
        q: non_empty(query.q.clone()),
        destination_id: query.destination_id,
        category: non_empty(query.category.clone()),
        luxury: query.luxury,
        min_price,
        max_price,
        duration_min: query.duration_min,
        duration_max: query.duration_max,
        featured: query.featured,
    })
}

fn price_bound(name: &str, value: Option<f64>) -> CoreResult<Option<Money>> {
    match value {
        None => Ok(None),
        Some(v) if v.is_finite() && v > 0.0 => Ok(Some(Money::from_dollars(v))),
        Some(_) => Err(CoreError::ValidationError(format!("{name} must be a positive number"))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
