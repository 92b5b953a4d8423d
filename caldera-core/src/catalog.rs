use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Destination {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub location: String,
    pub image_gallery: Vec<String>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub featured: bool,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItineraryDay {
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub activities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Package {
    pub id: Uuid,
    pub destination_id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub duration_days: u32,
    pub group_size_limit: u32,
    pub inclusions: Vec<String>,
    pub exclusions: Vec<String>,
    pub itinerary: Vec<ItineraryDay>,
    pub base_price: Money,
    pub discount_percent: Option<f64>,
    pub featured: bool,
    pub luxury_certified: bool,
    pub is_published: bool,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Package {
    /// Slug lookups also accept the package id.
    pub fn matches_slug(&self, slug: &str) -> bool {
        self.slug == slug || self.id.to_string() == slug
    }
}

/// A selectable component of a package (accommodation, transfer, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageItem {
    pub id: Uuid,
    pub package_id: Uuid,
    pub name: String,
    pub category: String,
    pub options: Vec<PackageOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageOption {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub item_id: Uuid,
    pub name: String,
    pub price: Money,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DestinationFilter {
    pub q: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub featured: Option<bool>,
}

impl DestinationFilter {
    pub fn matches(&self, destination: &Destination) -> bool {
        destination.is_published
            && self.q.as_deref().map_or(true, |q| contains_ci(&destination.name, q))
            && self.country.as_deref().map_or(true, |c| contains_ci(&destination.location, c))
            && self.region.as_deref().map_or(true, |r| contains_ci(&destination.location, r))
            && self.featured.map_or(true, |f| destination.featured == f)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageFilter {
    pub q: Option<String>,
    pub destination_id: Option<Uuid>,
    pub category: Option<String>,
    pub luxury: Option<bool>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub duration_min: Option<u32>,
    pub duration_max: Option<u32>,
    pub featured: Option<bool>,
}

impl PackageFilter {
    pub fn matches(&self, package: &Package) -> bool {
        package.is_published
            && self.q.as_deref().map_or(true, |q| contains_ci(&package.title, q))
            && self.destination_id.map_or(true, |d| package.destination_id == d)
            && self.category.as_deref().map_or(true, |c| package.category == c)
            && self.luxury.map_or(true, |l| package.luxury_certified == l)
            && self.min_price.map_or(true, |p| package.base_price >= p)
            && self.max_price.map_or(true, |p| package.base_price <= p)
            && self.duration_min.map_or(true, |d| package.duration_days >= d)
            && self.duration_max.map_or(true, |d| package.duration_days <= d)
            && self.featured.map_or(true, |f| package.featured == f)
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package() -> Package {
        Package {
            id: Uuid::new_v4(),
            destination_id: Uuid::new_v4(),
            slug: "serengeti-safari".to_string(),
            title: "Luxury Serengeti Safari".to_string(),
            description: String::new(),
            category: "safari".to_string(),
            duration_days: 7,
            group_size_limit: 8,
            inclusions: vec![],
            exclusions: vec![],
            itinerary: vec![],
            base_price: Money::from_dollars(2000.0),
            discount_percent: Some(10.0),
            featured: true,
            luxury_certified: true,
            is_published: true,
            rating: None,
            review_count: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_package_filter_ranges() {
        let pkg = package();
        let filter = PackageFilter {
            min_price: Some(Money::from_dollars(1500.0)),
            max_price: Some(Money::from_dollars(2000.0)),
            duration_min: Some(7),
            ..Default::default()
        };
        assert!(filter.matches(&pkg));

        let filter = PackageFilter {
            duration_max: Some(5),
            ..Default::default()
        };
        assert!(!filter.matches(&pkg));
    }

    #[test]
    fn test_package_filter_text_is_case_insensitive() {
        let filter = PackageFilter {
            q: Some("serengeti".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&package()));
    }

    #[test]
    fn test_unpublished_never_matches() {
        let mut pkg = package();
        pkg.is_published = false;
        assert!(!PackageFilter::default().matches(&pkg));
    }

    #[test]
    fn test_matches_slug_accepts_id() {
        let pkg = package();
        assert!(pkg.matches_slug("serengeti-safari"));
        assert!(pkg.matches_slug(&pkg.id.to_string()));
        assert!(!pkg.matches_slug("zanzibar"));
    }
}
