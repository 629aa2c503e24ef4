//! Image storage object keys and public URLs.
//!
//! Public URLs have the shape `{base}/{bucket}/{object_path}`, so the
//! object path of a stored image can be recovered from its URL when the
//! listing is deleted.

use crate::error::CoreError;

/// Object-path prefix for listing images.
pub const PUPPY_IMAGE_PREFIX: &str = "puppies";

/// Maximum accepted upload size (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Extensions accepted for uploaded images.
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Recover the object path of `url` inside `bucket`.
///
/// Returns `None` for URLs that do not point into the bucket or whose path
/// would escape it.
pub fn object_path_from_url(url: &str, bucket: &str) -> Option<String> {
    let marker = format!("/{bucket}/");
    let start = url.find(&marker)? + marker.len();
    let rest = &url[start..];
    let end = rest.find(|c: char| c == '?' || c == '#').unwrap_or(rest.len());
    let path = &rest[..end];

    if path.is_empty()
        || path.starts_with('/')
        || path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return None;
    }
    Some(path.to_string())
}

/// Public URL of an object.
pub fn public_url(base_url: &str, bucket: &str, object_path: &str) -> String {
    format!("{}/{bucket}/{object_path}", base_url.trim_end_matches('/'))
}

/// Normalize and validate an uploaded file's extension.
pub fn validate_image_extension(filename: &str) -> Result<String, CoreError> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported image type '{filename}'. Allowed: {}",
            ALLOWED_IMAGE_EXTENSIONS.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUCKET: &str = "puppy-images";

    #[test]
    fn path_from_public_url() {
        let url = "https://cdn.example.com/storage/v1/object/public/puppy-images/puppies/a1.jpg";
        assert_eq!(
            object_path_from_url(url, BUCKET).as_deref(),
            Some("puppies/a1.jpg")
        );
    }

    #[test]
    fn query_string_is_stripped() {
        let url = "http://localhost/puppy-images/puppies/a1.jpg?width=300";
        assert_eq!(
            object_path_from_url(url, BUCKET).as_deref(),
            Some("puppies/a1.jpg")
        );
    }

    #[test]
    fn foreign_urls_are_ignored() {
        assert!(object_path_from_url("https://images.example.com/dog.jpg", BUCKET).is_none());
        assert!(object_path_from_url("http://x/puppy-images/", BUCKET).is_none());
    }

    #[test]
    fn traversal_is_rejected() {
        let url = "http://x/puppy-images/puppies/../../etc/passwd";
        assert!(object_path_from_url(url, BUCKET).is_none());
    }

    #[test]
    fn public_url_round_trip() {
        let url = public_url("http://localhost:3000/storage/", BUCKET, "puppies/a.png");
        assert_eq!(url, "http://localhost:3000/storage/puppy-images/puppies/a.png");
        assert_eq!(
            object_path_from_url(&url, BUCKET).as_deref(),
            Some("puppies/a.png")
        );
    }

    #[test]
    fn image_extensions() {
        assert_eq!(validate_image_extension("Dog.JPG").unwrap(), "jpg");
        assert!(validate_image_extension("notes.txt").is_err());
        assert!(validate_image_extension("noext").is_err());
    }
}
