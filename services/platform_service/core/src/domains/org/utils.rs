/// Generate a URL-safe slug from a display name
///
/// Lowercases, maps non-alphanumerics to hyphens, collapses runs, trims the
/// ends. None when nothing alphanumeric remains.
pub fn generate_slug(name: &str) -> Option<String> {
    let slug = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slug() {
        assert_eq!(generate_slug("Acme Corp"), Some("acme-corp".to_string()));
    }

    #[test]
    fn test_collapses_special_characters() {
        assert_eq!(
            generate_slug("  Acme -- Corp! (EU)  "),
            Some("acme-corp-eu".to_string())
        );
    }

    #[test]
    fn test_rejects_non_alphanumeric_names() {
        assert_eq!(generate_slug("!!!"), None);
        assert_eq!(generate_slug(""), None);
    }
}
