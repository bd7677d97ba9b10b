//! URL slug helpers

use super::{ServiceError, ServiceResult};
use std::future::Future;

/// Derive a URL slug from a title or name.
///
/// The result contains only lowercase ASCII letters, digits and single
/// hyphens, with no hyphen at either end. It is empty when the input has
/// no ASCII alphanumerics at all.
pub fn generate_slug(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_hyphen = false;

    for c in text.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen && !result.is_empty() {
            result.push('-');
            prev_hyphen = true;
        }
    }

    while result.ends_with('-') {
        result.pop();
    }
    result
}

/// Resolve the slug for a new or renamed record.
///
/// An explicit slug is normalized and must be free. Without one, the slug
/// is derived from `source` (or `fallback` when that yields nothing) and
/// suffixed with `-2`, `-3`, ... until it is free.
pub async fn resolve_slug<F, Fut>(
    explicit: Option<&str>,
    source: &str,
    fallback: &str,
    exists: F,
) -> ServiceResult<String>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    if let Some(explicit) = explicit.filter(|s| !s.trim().is_empty()) {
        let slug = generate_slug(explicit);
        if slug.is_empty() {
            return Err(ServiceError::Validation(format!(
                "Slug '{}' has no usable characters",
                explicit
            )));
        }
        if exists(slug.clone()).await? {
            return Err(ServiceError::Conflict(format!("Slug '{}' is already in use", slug)));
        }
        return Ok(slug);
    }

    let mut base = generate_slug(source);
    if base.is_empty() {
        base = fallback.to_string();
    }

    let mut candidate = base.clone();
    let mut suffix = 2;
    while exists(candidate.clone()).await? {
        candidate = format!("{}-{}", base, suffix);
        suffix += 1;
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("Hello World"), "hello-world");
        assert_eq!(generate_slug("  Open House 2024!  "), "open-house-2024");
        assert_eq!(generate_slug("a -- b__c"), "a-b-c");
        assert_eq!(generate_slug("---"), "");
        assert_eq!(generate_slug("Café Night"), "caf-night");
    }

    async fn resolve(explicit: Option<&str>, source: &str, taken: &[&str]) -> ServiceResult<String> {
        let taken: HashSet<String> = taken.iter().map(|s| s.to_string()).collect();
        resolve_slug(explicit, source, "item", |slug| {
            let found = taken.contains(&slug);
            async move { Ok::<bool, anyhow::Error>(found) }
        })
        .await
    }

    #[tokio::test]
    async fn test_generated_slug_gets_numeric_suffix() {
        assert_eq!(resolve(None, "Expo", &[]).await.unwrap(), "expo");
        assert_eq!(resolve(None, "Expo", &["expo"]).await.unwrap(), "expo-2");
        assert_eq!(resolve(None, "Expo", &["expo", "expo-2"]).await.unwrap(), "expo-3");
    }

    #[tokio::test]
    async fn test_fallback_when_title_has_no_ascii() {
        assert_eq!(resolve(None, "活动", &[]).await.unwrap(), "item");
    }

    #[tokio::test]
    async fn test_explicit_slug_conflicts() {
        assert_eq!(resolve(Some("My Slug"), "x", &[]).await.unwrap(), "my-slug");
        let err = resolve(Some("taken"), "x", &["taken"]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        let err = resolve(Some("!!!"), "x", &[]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
