//! Public Suffix List lookups.
//!
//! [`PublicSuffixList`] wraps a parsed list and answers "what is the
//! registrable domain of this host". The resolver only sees it through the
//! [`SuffixLookup`] trait, so callers decide which list instance is used.

use std::path::Path;
use std::str::FromStr;

use once_cell::sync::OnceCell;
use publicsuffix::{List, Psl};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::file::read_file;

/// Snapshot of the public suffix list compiled into the crate.
pub const BUNDLED_LIST: &str = include_str!("../resources/public_suffix_list.dat");

const ICANN_BEGIN: &str = "===BEGIN ICANN DOMAINS===";
const ICANN_END: &str = "===END ICANN DOMAINS===";

/// Trait for registrable-domain lookups
pub trait SuffixLookup: Send + Sync {
    /// Registrable domain (public suffix plus one label) of `hostname`.
    ///
    /// Returns `None` when no registrable domain exists.
    fn suffix(&self, hostname: &str) -> Option<String>;
}

impl<T: SuffixLookup + ?Sized> SuffixLookup for &T {
    fn suffix(&self, hostname: &str) -> Option<String> {
        (**self).suffix(hostname)
    }
}

impl<T: SuffixLookup + ?Sized> SuffixLookup for std::sync::Arc<T> {
    fn suffix(&self, hostname: &str) -> Option<String> {
        (**self).suffix(hostname)
    }
}

/// Lookup behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SuffixOptions {
    /// Treat names under a TLD missing from the list as registrable
    pub accept_unknown: bool,
    /// Use only the ICANN section, ignoring privately registered suffixes
    pub only_icann: bool,
}

impl Default for SuffixOptions {
    fn default() -> Self {
        Self {
            accept_unknown: false,
            only_icann: true,
        }
    }
}

impl SuffixOptions {
    /// Create options with defaults (reject unknown, ICANN only).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether unknown suffixes are accepted.
    pub fn with_accept_unknown(mut self, accept: bool) -> Self {
        self.accept_unknown = accept;
        self
    }

    /// Set whether only ICANN suffixes are recognized.
    pub fn with_only_icann(mut self, only_icann: bool) -> Self {
        self.only_icann = only_icann;
        self
    }
}

/// Parsed public suffix list.
pub struct PublicSuffixList {
    list: List,
    options: SuffixOptions,
}

impl std::fmt::Debug for PublicSuffixList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicSuffixList")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Keep the ICANN section of a list (marker line included).
///
/// A list without section markers is taken as all-ICANN.
fn icann_section(text: &str) -> String {
    let Some(begin) = text.find(ICANN_BEGIN) else {
        return with_icann_marker(text);
    };
    // Back up to the start of the marker line
    let start = text[..begin].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[begin..]
        .find(ICANN_END)
        .map(|i| begin + i)
        .unwrap_or(text.len());
    text[start..end].to_string()
}

fn with_icann_marker(text: &str) -> String {
    format!("// {}\n{}", ICANN_BEGIN, text)
}

impl PublicSuffixList {
    /// Build a list from the text of a `public_suffix_list.dat` file.
    pub fn from_text(text: &str, options: SuffixOptions) -> Result<Self> {
        let source = if options.only_icann {
            icann_section(text)
        } else if text.contains(ICANN_BEGIN) {
            text.to_string()
        } else {
            with_icann_marker(text)
        };

        let rules = source
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with("//"))
            .count();
        if rules == 0 {
            return Err(Error::fatal("Public suffix list contains no rules"));
        }

        let list = List::from_str(&source)
            .map_err(|e| Error::fatal(format!("Invalid public suffix list: {}", e)))?;
        tracing::debug!(
            rules,
            only_icann = options.only_icann,
            accept_unknown = options.accept_unknown,
            "loaded public suffix list"
        );
        Ok(Self { list, options })
    }

    /// Load a list from a file.
    pub fn from_file(path: impl AsRef<Path>, options: SuffixOptions) -> Result<Self> {
        let text = read_file(path)?;
        Self::from_text(&text, options)
    }

    /// The snapshot bundled with the crate.
    pub fn bundled(options: SuffixOptions) -> Result<Self> {
        Self::from_text(BUNDLED_LIST, options)
    }

    pub fn options(&self) -> SuffixOptions {
        self.options
    }

    /// Public suffix of `hostname` (e.g. `co.uk` for `www.example.co.uk`).
    pub fn public_suffix(&self, hostname: &str) -> Option<String> {
        let name = hostname.to_ascii_lowercase();
        let suffix = self.list.suffix(name.as_bytes())?;
        if !self.options.accept_unknown && !suffix.is_known() {
            return None;
        }
        String::from_utf8(suffix.as_bytes().to_vec()).ok()
    }

    /// Registrable domain of `hostname` (e.g. `example.co.uk` for
    /// `www.example.co.uk`).
    pub fn suffix(&self, hostname: &str) -> Option<String> {
        if hostname.is_empty() {
            return None;
        }
        let name = hostname.to_ascii_lowercase();
        let domain = self.list.domain(name.as_bytes())?;
        if !self.options.accept_unknown && !domain.suffix().is_known() {
            return None;
        }
        String::from_utf8(domain.as_bytes().to_vec()).ok()
    }
}

impl SuffixLookup for PublicSuffixList {
    fn suffix(&self, hostname: &str) -> Option<String> {
        PublicSuffixList::suffix(self, hostname)
    }
}

static SHARED: OnceCell<std::result::Result<PublicSuffixList, String>> = OnceCell::new();

/// Process-wide bundled list (ICANN only, unknown suffixes rejected).
///
/// Built on first use; concurrent first callers wait for a single
/// initialization. A failed build is logged once and the same error is
/// returned to every later caller.
pub fn shared_list() -> Result<&'static PublicSuffixList> {
    SHARED
        .get_or_init(|| {
            PublicSuffixList::bundled(SuffixOptions::default()).map_err(|e| {
                tracing::error!(error = %e, "bundled public suffix list unavailable");
                e.to_string()
            })
        })
        .as_ref()
        .map_err(|msg| Error::fatal(format!("Public suffix list unavailable: {}", msg)))
}
