//! Public catalog filtering and sorting.
//!
//! The storefront's browse page filters a small in-memory set of listings,
//! so the rules live here rather than in SQL. Entries are accessed through
//! [`CatalogEntry`] so the DB row types can be filtered directly.

use std::cmp::Ordering;

use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

use crate::types::{Money, Timestamp};

/// Read access to the fields the catalog filters and sorts on.
pub trait CatalogEntry {
    fn name(&self) -> &str;
    fn breed_slug(&self) -> Option<&str>;
    fn status(&self) -> &str;
    fn gender(&self) -> Option<&str>;
    fn price(&self) -> Money;
    fn featured(&self) -> bool;
    fn created_at(&self) -> Timestamp;
}

/// Sort orders offered by the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSort {
    /// Featured first, then by name.
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    Name,
    Newest,
}

/// Query parameters for `GET /api/puppies`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    /// Breed slug.
    pub breed: Option<String>,
    pub status: Option<String>,
    pub gender: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub featured: Option<bool>,
    #[serde(default)]
    pub sort: CatalogSort,
}

impl CatalogQuery {
    pub fn matches<E: CatalogEntry>(&self, entry: &E) -> bool {
        if let Some(breed) = self.breed.as_deref() {
            if entry.breed_slug() != Some(breed) {
                return false;
            }
        }
        if let Some(status) = self.status.as_deref() {
            if entry.status() != status {
                return false;
            }
        }
        if let Some(gender) = self.gender.as_deref() {
            let matches_gender = entry
                .gender()
                .is_some_and(|g| g.eq_ignore_ascii_case(gender));
            if !matches_gender {
                return false;
            }
        }
        if let Some(featured) = self.featured {
            if entry.featured() != featured {
                return false;
            }
        }
        let price = entry.price().to_f64().unwrap_or(0.0);
        if self.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| price > max) {
            return false;
        }
        true
    }

    /// Filter and sort a set of entries.
    pub fn apply<E: CatalogEntry>(&self, entries: Vec<E>) -> Vec<E> {
        let mut out: Vec<E> = entries.into_iter().filter(|e| self.matches(e)).collect();
        out.sort_by(|a, b| compare(self.sort, a, b));
        out
    }
}

fn compare<E: CatalogEntry>(sort: CatalogSort, a: &E, b: &E) -> Ordering {
    match sort {
        CatalogSort::Featured => compare_featured_then_name(a, b),
        CatalogSort::PriceAsc => a.price().cmp(&b.price()).then_with(|| a.name().cmp(b.name())),
        CatalogSort::PriceDesc => b.price().cmp(&a.price()).then_with(|| a.name().cmp(b.name())),
        CatalogSort::Name => a.name().cmp(b.name()),
        CatalogSort::Newest => b.created_at().cmp(&a.created_at()),
    }
}

/// `featured desc, name asc`, the default listing order.
pub fn compare_featured_then_name<E: CatalogEntry>(a: &E, b: &E) -> Ordering {
    b.featured()
        .cmp(&a.featured())
        .then_with(|| a.name().cmp(b.name()))
}

/// Derive a URL slug from a display name (`"Golden Retriever"` -> `"golden-retriever"`).
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
