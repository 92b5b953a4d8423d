use async_trait::async_trait;
use caldera_core::catalog::{
    Destination, DestinationFilter, ItineraryDay, Package, PackageFilter, PackageItem, PackageOption,
};
use caldera_core::repository::CatalogRepository;
use caldera_core::{CoreResult, Money};
use caldera_shared::{PageMeta, PageRequest};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::store_error;

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct DestinationRow {
    id: Uuid,
    slug: String,
    name: String,
    description: String,
    location: String,
    image_gallery: Vec<String>,
    rating: Option<f64>,
    review_count: Option<i64>,
    featured: bool,
    is_published: bool,
    created_at: DateTime<Utc>,
}

impl From<DestinationRow> for Destination {
    fn from(row: DestinationRow) -> Self {
        Destination {
            id: row.id,
            slug: row.slug,
            name: row.name,
            description: row.description,
            location: row.location,
            image_gallery: row.image_gallery,
            rating: row.rating,
            review_count: row.review_count,
            featured: row.featured,
            is_published: row.is_published,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PackageRow {
    id: Uuid,
    destination_id: Uuid,
    slug: String,
    title: String,
    description: String,
    category: String,
    duration_days: i32,
    group_size_limit: i32,
    inclusions: Vec<String>,
    exclusions: Vec<String>,
    itinerary: Json<Vec<ItineraryDay>>,
    base_price_cents: i64,
    discount_percent: Option<f64>,
    featured: bool,
    luxury_certified: bool,
    is_published: bool,
    rating: Option<f64>,
    review_count: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<PackageRow> for Package {
    fn from(row: PackageRow) -> Self {
        Package {
            id: row.id,
            destination_id: row.destination_id,
            slug: row.slug,
            title: row.title,
            description: row.description,
            category: row.category,
            // CHECK constraints keep both positive.
            duration_days: row.duration_days.max(0) as u32,
            group_size_limit: row.group_size_limit.max(0) as u32,
            inclusions: row.inclusions,
            exclusions: row.exclusions,
            itinerary: row.itinerary.0,
            base_price: Money::from_cents(row.base_price_cents),
            discount_percent: row.discount_percent,
            featured: row.featured,
            luxury_certified: row.luxury_certified,
            is_published: row.is_published,
            rating: row.rating,
            review_count: row.review_count,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OptionRow {
    id: Uuid,
    item_id: Uuid,
    name: String,
    price_cents: i64,
}

impl From<OptionRow> for PackageOption {
    fn from(row: OptionRow) -> Self {
        PackageOption {
            id: row.id,
            item_id: row.item_id,
            name: row.name,
            price: Money::from_cents(row.price_cents),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    package_id: Uuid,
    name: String,
    category: String,
}

const DESTINATION_COLUMNS: &str = "id, slug, name, description, location, image_gallery, rating, \
     review_count, featured, is_published, created_at";

const PACKAGE_COLUMNS: &str = "id, destination_id, slug, title, description, category, duration_days, \
     group_size_limit, inclusions, exclusions, itinerary, base_price_cents, discount_percent, featured, \
     luxury_certified, is_published, rating, review_count, created_at";

// Filters bind as nullable parameters so list and count share one WHERE clause.
const DESTINATION_WHERE: &str = "is_published \
     AND ($1::text IS NULL OR name ILIKE '%' || $1 || '%' ESCAPE '\\') \
     AND ($2::text IS NULL OR location ILIKE '%' || $2 || '%' ESCAPE '\\') \
     AND ($3::text IS NULL OR location ILIKE '%' || $3 || '%' ESCAPE '\\') \
     AND ($4::bool IS NULL OR featured = $4)";

const PACKAGE_WHERE: &str = "is_published \
     AND ($1::text IS NULL OR title ILIKE '%' || $1 || '%' ESCAPE '\\') \
     AND ($2::uuid IS NULL OR destination_id = $2) \
     AND ($3::text IS NULL OR category = $3) \
     AND ($4::bool IS NULL OR luxury_certified = $4) \
     AND ($5::bigint IS NULL OR base_price_cents >= $5) \
     AND ($6::bigint IS NULL OR base_price_cents <= $6) \
     AND ($7::int IS NULL OR duration_days >= $7) \
     AND ($8::int IS NULL OR duration_days <= $8) \
     AND ($9::bool IS NULL OR featured = $9)";

/// Escapes LIKE metacharacters so user text matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn list_destinations(
        &self,
        filter: &DestinationFilter,
        page: PageRequest,
    ) -> CoreResult<(Vec<Destination>, PageMeta)> {
        let list_sql = format!(
            "SELECT {DESTINATION_COLUMNS} FROM destinations WHERE {DESTINATION_WHERE} \
             ORDER BY created_at DESC LIMIT $5 OFFSET $6"
        );
        let q = filter.q.as_deref().map(escape_like);
        let country = filter.country.as_deref().map(escape_like);
        let region = filter.region.as_deref().map(escape_like);

        let rows: Vec<DestinationRow> = sqlx::query_as(&list_sql)
            .bind(q.as_deref())
            .bind(country.as_deref())
            .bind(region.as_deref())
            .bind(filter.featured)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        let count_sql = format!("SELECT COUNT(*) FROM destinations WHERE {DESTINATION_WHERE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(q.as_deref())
            .bind(country.as_deref())
            .bind(region.as_deref())
            .bind(filter.featured)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        Ok((rows.into_iter().map(Destination::from).collect(), page.meta(total)))
    }

    async fn find_destination(&self, slug: &str) -> CoreResult<Option<Destination>> {
        let sql = format!(
            "SELECT {DESTINATION_COLUMNS} FROM destinations \
             WHERE is_published AND (slug = $1 OR id::text = $1)"
        );
        let row: Option<DestinationRow> = sqlx::query_as(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.map(Destination::from))
    }

    async fn list_packages(
        &self,
        filter: &PackageFilter,
        page: PageRequest,
    ) -> CoreResult<(Vec<Package>, PageMeta)> {
        let duration_min = filter.duration_min.map(|d| i32::try_from(d).unwrap_or(i32::MAX));
        let duration_max = filter.duration_max.map(|d| i32::try_from(d).unwrap_or(i32::MAX));
        let min_price = filter.min_price.map(Money::cents);
        let max_price = filter.max_price.map(Money::cents);
        let q = filter.q.as_deref().map(escape_like);

        let list_sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages WHERE {PACKAGE_WHERE} \
             ORDER BY created_at DESC LIMIT $10 OFFSET $11"
        );
        let rows: Vec<PackageRow> = sqlx::query_as(&list_sql)
            .bind(q.as_deref())
            .bind(filter.destination_id)
            .bind(filter.category.as_deref())
            .bind(filter.luxury)
            .bind(min_price)
            .bind(max_price)
            .bind(duration_min)
            .bind(duration_max)
            .bind(filter.featured)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        let count_sql = format!("SELECT COUNT(*) FROM packages WHERE {PACKAGE_WHERE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(q.as_deref())
            .bind(filter.destination_id)
            .bind(filter.category.as_deref())
            .bind(filter.luxury)
            .bind(min_price)
            .bind(max_price)
            .bind(duration_min)
            .bind(duration_max)
            .bind(filter.featured)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        Ok((rows.into_iter().map(Package::from).collect(), page.meta(total)))
    }

    async fn find_package(&self, slug: &str) -> CoreResult<Option<Package>> {
        let sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages WHERE is_published AND (slug = $1 OR id::text = $1)"
        );
        let row: Option<PackageRow> = sqlx::query_as(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.map(Package::from))
    }

    async fn find_published_package(&self, id: Uuid) -> CoreResult<Option<Package>> {
        let sql = format!("SELECT {PACKAGE_COLUMNS} FROM packages WHERE is_published AND id = $1");
        let row: Option<PackageRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.map(Package::from))
    }

    async fn find_options(&self, ids: &[Uuid]) -> CoreResult<Vec<PackageOption>> {
        let rows: Vec<OptionRow> = sqlx::query_as(
            "SELECT id, item_id, name, price_cents FROM package_item_options WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(rows.into_iter().map(PackageOption::from).collect())
    }

    async fn list_package_items(&self, package_id: Uuid) -> CoreResult<Vec<PackageItem>> {
        let items: Vec<ItemRow> = sqlx::query_as(
            "SELECT id, package_id, name, category FROM package_items \
             WHERE package_id = $1 ORDER BY position, name",
        )
        .bind(package_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        let item_ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
        let options: Vec<OptionRow> = sqlx::query_as(
            "SELECT id, item_id, name, price_cents FROM package_item_options \
             WHERE item_id = ANY($1) ORDER BY position, name",
        )
        .bind(&item_ids[..])
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        let mut options: Vec<PackageOption> = options.into_iter().map(PackageOption::from).collect();
        Ok(items
            .into_iter()
            .map(|item| {
                let (mine, rest): (Vec<_>, Vec<_>) =
                    options.drain(..).partition(|opt| opt.item_id == item.id);
                options = rest;
                PackageItem {
                    id: item.id,
                    package_id: item.package_id,
                    name: item.name,
                    category: item.category,
                    options: mine,
                }
            })
            .collect())
    }

    async fn update_package_rating(&self, package_id: Uuid, rating: f64, review_count: i64) -> CoreResult<()> {
        sqlx::query("UPDATE packages SET rating = $2, review_count = $3 WHERE id = $1")
            .bind(package_id)
            .bind(rating)
            .bind(review_count)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
