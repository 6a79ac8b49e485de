//! Registrable-domain surmising for proxy rules.
//!
//! A rule such as `||*.example.com/path*` or `http://a.b.example.co.uk/x`
//! is normalized down to a host candidate, which is then collapsed to its
//! registrable domain through a [`SuffixLookup`].
//!
//! Normalization runs once, in a fixed order:
//! 1. wildcard stripping (only when the rule contains `*`)
//! 2. leading `.` removal
//! 3. percent-decoding (only when the rule contains a literal `%2F`)
//! 4. host extraction (URL, path fragment or bare domain)

use std::borrow::Cow;
use std::num::NonZeroUsize;

use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Deserialize;

use crate::error::Result;
use crate::psl::{shared_list, SuffixLookup};

/// Default LRU cache size (disabled)
pub const DEFAULT_CACHE_SIZE: usize = 0;

/// `/segment*.` right after a path separator
static PATH_SEGMENT_WILDCARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/[a-zA-Z0-9]+\*\.").expect("PATH_SEGMENT_WILDCARD: hardcoded regex is invalid")
});

/// `*token` anywhere
static WILDCARD_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*[a-zA-Z0-9_%]+").expect("WILDCARD_TOKEN: hardcoded regex is invalid")
});

/// `token*` at the start
static LEADING_TOKEN_WILDCARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_%]+\*").expect("LEADING_TOKEN_WILDCARD: hardcoded regex is invalid")
});

/// Strip wildcard markers from a rule.
///
/// Single pass: rules with several wildcards in unusual places may keep
/// some `*` characters (e.g. `*.sub*.example.com` becomes `.sub*.example.com`).
pub fn clear_asterisk(rule: &str) -> Cow<'_, str> {
    if !rule.contains('*') {
        return Cow::Borrowed(rule);
    }

    let rule = rule.trim_matches('*').replace("/*.", "/");
    let rule = PATH_SEGMENT_WILDCARD.replace_all(&rule, "/");
    let rule = WILDCARD_TOKEN.replace_all(&rule, "");
    let rule = LEADING_TOKEN_WILDCARD.replace(&rule, "");
    Cow::Owned(rule.into_owned())
}

/// Host of a URL, read lexically from its authority.
///
/// No IDNA conversion, percent-decoding or port validation: the host is the
/// authority text minus userinfo and port, lower-cased. A URL without `//`
/// after the scheme has no host.
fn url_host(url: &str) -> String {
    let Some((_, rest)) = url.split_once(':') else {
        return String::new();
    };
    let Some(rest) = rest.strip_prefix("//") else {
        return String::new();
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    // Unbalanced brackets make the whole URL invalid
    if authority.contains('[') != authority.contains(']') {
        return String::new();
    }

    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = match host_port.split_once('[') {
        Some((_, bracketed)) => bracketed.split_once(']').map_or(bracketed, |(h, _)| h),
        None => host_port.split_once(':').map_or(host_port, |(h, _)| h),
    };
    host.to_lowercase()
}

/// Host candidate of a rule, before any suffix lookup.
///
/// Returns an empty string when the rule names no host.
pub fn surmise_host(rule: &str) -> String {
    let cleared = clear_asterisk(rule);
    let rule = cleared.trim_start_matches('.');

    let decoded;
    let rule = if rule.contains("%2F") {
        decoded = percent_decode_str(rule).decode_utf8_lossy();
        &*decoded
    } else {
        rule
    };

    if rule.starts_with("http:") || rule.starts_with("https:") {
        url_host(rule)
    } else if rule.find('/').is_some_and(|i| i > 0) {
        url_host(&format!("http://{}", rule))
    } else if rule.find('.').is_some_and(|i| i > 0) {
        rule.to_string()
    } else {
        String::new()
    }
}

/// Resolve a rule to its registrable domain with the given lookup.
pub fn resolve_with<L: SuffixLookup + ?Sized>(lookup: &L, rule: &str) -> String {
    let host = surmise_host(rule);
    if host.is_empty() {
        tracing::trace!(rule, "no host in rule");
        return String::new();
    }

    let domain = lookup.suffix(&host.to_lowercase()).unwrap_or_default();
    tracing::trace!(rule, host = %host, domain = %domain, "surmised domain");
    domain
}

/// Resolve a rule against the process-wide bundled suffix list.
///
/// `Ok("")` means the rule names no registrable domain. An error means the
/// suffix list itself could not be loaded.
pub fn surmise_domain(rule: &str) -> Result<String> {
    let list = shared_list()?;
    Ok(resolve_with(list, rule))
}

/// Resolver options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// LRU cache size for rule resolution results (0, the default, disables
    /// the cache)
    pub cache_size: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

impl ResolverOptions {
    /// Create new resolver options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cache size.
    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }
}

/// Resolves proxy rules to registrable domains.
///
/// The suffix lookup is supplied by the caller; pass `shared_list()?` to use
/// the bundled list, or a [`PublicSuffixList`](crate::PublicSuffixList)
/// loaded from a file.
pub struct DomainResolver<L> {
    lookup: L,
    cache: Option<Mutex<LruCache<String, String>>>,
}

impl<L: SuffixLookup> DomainResolver<L> {
    /// Create a resolver with default options.
    pub fn new(lookup: L) -> Self {
        Self::with_options(lookup, ResolverOptions::default())
    }

    /// Create a resolver with explicit options.
    pub fn with_options(lookup: L, options: ResolverOptions) -> Self {
        let cache = NonZeroUsize::new(options.cache_size).map(|n| Mutex::new(LruCache::new(n)));
        Self { lookup, cache }
    }

    /// Registrable domain named by `rule`, or an empty string.
    pub fn resolve(&self, rule: &str) -> String {
        let Some(cache) = &self.cache else {
            return resolve_with(&self.lookup, rule);
        };

        if let Some(domain) = cache.lock().get(rule) {
            return domain.clone();
        }

        // Computed outside the lock; concurrent misses on one rule may both
        // compute, and the results are identical
        let domain = resolve_with(&self.lookup, rule);
        cache.lock().put(rule.to_string(), domain.clone());
        domain
    }

    /// Get the underlying suffix lookup
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Takes the last two labels, counting calls.
    #[derive(Default)]
    struct LastTwoLabels {
        calls: AtomicUsize,
    }

    impl SuffixLookup for LastTwoLabels {
        fn suffix(&self, hostname: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let labels: Vec<&str> = hostname.rsplitn(3, '.').collect();
            if labels.len() < 2 {
                return None;
            }
            Some(format!("{}.{}", labels[1], labels[0]))
        }
    }

    #[test]
    fn test_regexes_compile() {
        assert!(PATH_SEGMENT_WILDCARD.is_match("/ab*."));
        assert!(WILDCARD_TOKEN.is_match("*ab"));
        assert!(LEADING_TOKEN_WILDCARD.is_match("ab*"));
    }

    #[test]
    fn test_clear_asterisk_without_wildcard_borrows() {
        assert!(matches!(clear_asterisk("example.com"), Cow::Borrowed("example.com")));
    }

    #[test]
    fn test_clear_asterisk_characterization() {
        let cases = [
            ("*.example.com", ".example.com"),
            ("example.*.com", "example.*.com"),
            ("*.sub*.example.com", ".sub*.example.com"),
            ("http://*.example.com/*", "http://example.com/"),
            ("foo*bar.example.com", "foo.example.com"),
            ("www.example.com/a/b*.c.js", "www.example.com/a/c.js"),
            ("ab*.example.com", ".example.com"),
            ("x/*.example.com", "x/example.com"),
            ("**.example.com*", ".example.com"),
            ("*", ""),
        ];
        for (rule, expected) in cases {
            assert_eq!(clear_asterisk(rule), expected, "rule: {}", rule);
        }
    }

    #[test]
    fn test_surmise_host() {
        let cases = [
            ("", ""),
            ("example.com", "example.com"),
            (".example.com", "example.com"),
            ("*.example.com", "example.com"),
            ("example.*.com", "example.*.com"),
            ("*.sub*.example.com", "sub*.example.com"),
            ("http://*.example.com/*", "example.com"),
            ("example.com/path", "example.com"),
            ("http://example.com/path?q=1", "example.com"),
            ("https://www.Example.com/", "www.example.com"),
            ("http://user:pw@example.com:8080/x", "example.com"),
            ("example.com:8080/x", "example.com"),
            ("www.example.com/a/b*.c.js", "www.example.com"),
            ("x/*.example.com", "x"),
            ("/path/only", ""),
            ("nonsense-no-dot", ""),
            ("Example.COM", "Example.COM"),
            ("http://1.2.3.4/x", "1.2.3.4"),
            ("http://[::1]/x", "::1"),
        ];
        for (rule, expected) in cases {
            assert_eq!(surmise_host(rule), expected, "rule: {}", rule);
        }
    }

    #[test]
    fn test_surmise_host_percent_decoding() {
        // Decoded only when a literal %2F is present
        assert_eq!(surmise_host("a%2Fb.example.com"), "a");
        assert_eq!(surmise_host("example.com%2Fpath"), "example.com");
        assert_eq!(
            surmise_host("http%3A%2F%2Fwww.Example.com%2Fx"),
            "www.example.com"
        );
        // %3A alone is left untouched
        assert_eq!(surmise_host("www.example.com%3A80"), "www.example.com%3A80");
        // Decoding happens once: %252F becomes %2F, not /
        assert_eq!(surmise_host("%2Fx%252F.example.com"), "/x%2F.example.com");
        assert_eq!(surmise_host("a.example.com%2F%252F"), "a.example.com");
    }

    #[test]
    fn test_surmise_host_idn_keeps_unicode() {
        // Same spelling from the bare-domain, URL and path branches
        assert_eq!(surmise_host("例子.中国"), "例子.中国");
        assert_eq!(surmise_host("http://www.例子.中国/x"), "www.例子.中国");
        assert_eq!(surmise_host("www.例子.中国/x"), "www.例子.中国");
    }

    #[test]
    fn test_surmise_host_port_not_validated() {
        assert_eq!(surmise_host("example.com:abc/x"), "example.com");
        assert_eq!(surmise_host("http://example.com:99999/x"), "example.com");
    }

    #[test]
    fn test_surmise_host_requires_authority() {
        assert_eq!(surmise_host("http:example.com/path"), "");
        assert_eq!(surmise_host("https:/example.com/path"), "");
    }

    #[test]
    fn test_surmise_host_not_percent_decoded() {
        assert_eq!(surmise_host("http://a%2eb.example.com/x"), "a%2eb.example.com");
    }

    #[test]
    fn test_surmise_host_authority_forms() {
        assert_eq!(surmise_host("http://Example.com?q=1"), "example.com");
        assert_eq!(surmise_host("http://example.com#top"), "example.com");
        assert_eq!(surmise_host("http://a@b@Example.com/x"), "example.com");
        assert_eq!(surmise_host("http://[2001:DB8::1]:8080/x"), "2001:db8::1");
        assert_eq!(surmise_host("http://[::1/x"), "");
        assert_eq!(surmise_host("http:///path"), "");
    }

    #[test]
    fn test_surmise_host_uppercase_scheme_is_path() {
        // Only lower-case schemes are recognized; "HTTP:" is taken as a host
        assert_eq!(surmise_host("HTTP://Example.COM/"), "http");
    }

    #[test]
    fn test_resolve_with_lowercases_host() {
        let lookup = LastTwoLabels::default();
        assert_eq!(resolve_with(&lookup, "WWW.Example.COM"), "example.com");
    }

    #[test]
    fn test_resolve_with_empty_host_skips_lookup() {
        let lookup = LastTwoLabels::default();
        assert_eq!(resolve_with(&lookup, ""), "");
        assert_eq!(resolve_with(&lookup, "nonsense-no-dot"), "");
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_resolver_cache() {
        let resolver = DomainResolver::with_options(
            LastTwoLabels::default(),
            ResolverOptions::new().with_cache_size(16),
        );
        assert_eq!(resolver.resolve("*.sub.example.com"), "example.com");
        assert_eq!(resolver.resolve("*.sub.example.com"), "example.com");
        assert_eq!(resolver.lookup().calls.load(Ordering::SeqCst), 1);

        resolver.clear_cache();
        assert_eq!(resolver.resolve("*.sub.example.com"), "example.com");
        assert_eq!(resolver.lookup().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_resolver_default_has_no_cache() {
        let resolver = DomainResolver::new(LastTwoLabels::default());
        resolver.resolve("a.example.com");
        resolver.resolve("a.example.com");
        assert_eq!(resolver.lookup().calls.load(Ordering::SeqCst), 2);
        // No-op without a cache
        resolver.clear_cache();
    }

    #[test]
    fn test_resolver_cache_shared_across_threads() {
        let resolver = std::sync::Arc::new(DomainResolver::with_options(
            LastTwoLabels::default(),
            ResolverOptions::new().with_cache_size(4),
        ));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let resolver = resolver.clone();
                std::thread::spawn(move || resolver.resolve(&format!("h{}.example.org", i % 2)))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "example.org");
        }
        assert_eq!(resolver.resolve("h0.example.org"), "example.org");
    }

    #[test]
    fn test_resolver_options_deserialize() {
        let opts: ResolverOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, ResolverOptions::default());
        let opts: ResolverOptions = serde_json::from_str(r#"{"cache_size": 0}"#).unwrap();
        assert_eq!(opts.cache_size, 0);
    }

    #[test]
    fn test_surmise_domain_shared_list() {
        assert_eq!(surmise_domain("*.sub.example.com").unwrap(), "example.com");
        assert_eq!(surmise_domain("").unwrap(), "");
    }
}
