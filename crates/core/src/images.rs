//! Ordered image lists for puppy listings.
//!
//! The first entry is the primary image; the API keeps the listing's
//! `image` column equal to it. Updates replace the whole list, there is no
//! merge. Callers editing a subset must read-modify-write with the
//! listing's `version` to avoid clobbering a concurrent edit.

use serde::{Deserialize, Serialize};

/// An ordered list of image URLs, primary first.
///
/// Deserializes through [`ImageList::new`], so blank entries from the wire
/// are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ImageList(Vec<String>);

impl From<Vec<String>> for ImageList {
    fn from(urls: Vec<String>) -> Self {
        Self::new(urls)
    }
}

impl From<ImageList> for Vec<String> {
    fn from(list: ImageList) -> Self {
        list.0
    }
}

impl ImageList {
    /// Build a list, dropping blank entries but keeping order and duplicates.
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            urls.into_iter()
                .map(|u| {
                    let u: String = u.into();
                    u.trim().to_string()
                })
                .filter(|u| !u.is_empty())
                .collect(),
        )
    }

    /// Assemble the list for a stored listing.
    ///
    /// Uses the child rows when there are any, otherwise falls back to the
    /// single `image` column.
    pub fn resolve(child_rows: Vec<String>, fallback: Option<&str>) -> Self {
        if child_rows.is_empty() {
            Self::new(fallback)
        } else {
            Self(child_rows)
        }
    }

    /// Move `primary` to the front, keeping the rest in order.
    ///
    /// The first existing occurrence of `primary` is moved; if it is not in
    /// the list it is prepended.
    pub fn with_primary(mut self, primary: &str) -> Self {
        match self.0.iter().position(|u| u == primary) {
            Some(i) => {
                let url = self.0.remove(i);
                self.0.insert(0, url);
            }
            None => self.0.insert(0, primary.to_string()),
        }
        self
    }

    pub fn primary(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Entries paired with their `sort_order`.
    pub fn with_sort_order(&self) -> impl Iterator<Item = (i32, &str)> {
        self.0
            .iter()
            .enumerate()
            .map(|(i, url)| (i as i32, url.as_str()))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Primary image to store alongside an optional new image list.
///
/// A supplied list wins over the explicit `image` field.
pub fn primary_image(images: Option<&ImageList>, image: Option<&str>) -> Option<String> {
    match images.and_then(ImageList::primary) {
        Some(first) => Some(first.to_string()),
        None => image
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    }
}
