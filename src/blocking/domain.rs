use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Please enter a valid domain, like example.com.")]
    InvalidDomain(String),
    #[error("This domain is already blocked.")]
    AlreadyBlocked(String),
}

fn domain_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("domain pattern is valid")
    })
}

/// Reduce user input to a bare lowercase domain.
///
/// Returns `Ok(None)` for blank input, which the form ignores.
pub fn normalize_domain(input: &str) -> Result<Option<String>, DomainError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let lowered = trimmed.to_ascii_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    let domain = without_www
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();

    if !domain_pattern().is_match(domain) {
        return Err(DomainError::InvalidDomain(trimmed.to_string()));
    }

    Ok(Some(domain.to_string()))
}

/// Ordered, duplicate-free list of blocked domains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainList {
    domains: Vec<String>,
}

impl DomainList {
    /// Build from stored values, dropping duplicates while keeping order.
    pub fn from_stored(stored: Vec<String>) -> Self {
        let mut list = Self::default();
        for domain in stored {
            if !list.contains(&domain) {
                list.domains.push(domain);
            }
        }
        list
    }

    pub fn as_slice(&self) -> &[String] {
        &self.domains
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.domains.clone()
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.domains.iter().any(|existing| existing == domain)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Validate `input` and append it. `Ok(None)` for blank input.
    pub fn add(&mut self, input: &str) -> Result<Option<String>, DomainError> {
        let Some(domain) = normalize_domain(input)? else {
            return Ok(None);
        };
        if self.contains(&domain) {
            return Err(DomainError::AlreadyBlocked(domain));
        }
        self.domains.push(domain.clone());
        Ok(Some(domain))
    }

    pub fn remove_at(&mut self, index: usize) -> Option<String> {
        (index < self.domains.len()).then(|| self.domains.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_scheme_www_and_path() {
        assert_eq!(
            normalize_domain("  https://www.YouTube.com/watch?v=1 ").unwrap(),
            Some("youtube.com".to_string())
        );
        assert_eq!(
            normalize_domain("http://news.ycombinator.com#top").unwrap(),
            Some("news.ycombinator.com".to_string())
        );
        assert_eq!(normalize_domain("reddit.com?x").unwrap(), Some("reddit.com".into()));
        assert_eq!(normalize_domain("   ").unwrap(), None);
    }

    #[test]
    fn normalize_rejects_non_domains() {
        for input in ["localhost", "https://", "exa mple.com", "example.c", "foo.123"] {
            assert!(
                matches!(normalize_domain(input), Err(DomainError::InvalidDomain(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn add_rejects_duplicates_without_mutation() {
        let mut list = DomainList::default();
        assert_eq!(list.add("x.com").unwrap(), Some("x.com".to_string()));
        let before = list.clone();

        assert_eq!(
            list.add("https://www.X.com/path"),
            Err(DomainError::AlreadyBlocked("x.com".to_string()))
        );
        assert!(list.add("not a domain").is_err());
        assert_eq!(list, before);
    }

    #[test]
    fn remove_at_out_of_range_is_none() {
        let mut list = DomainList::from_stored(vec!["a.com".into(), "b.com".into(), "a.com".into()]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.remove_at(5), None);
        assert_eq!(list.remove_at(0), Some("a.com".to_string()));
        assert_eq!(list.as_slice(), ["b.com".to_string()]);
    }
}
