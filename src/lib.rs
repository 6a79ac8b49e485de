//! genpac-util - helper utilities for PAC (proxy auto-config) generators
//!
//! This library provides:
//! - Registrable-domain surmising for proxy rules (wildcards, URLs,
//!   percent-encoded fragments) over the Public Suffix List
//! - Public Suffix List loading with ICANN-only and unknown-TLD policies
//! - File helpers with `~` expansion and structured I/O errors
//! - Bundled resource lookup
//! - Coercion helpers for loosely typed configuration values
//!
//! # Example
//!
//! ```rust
//! use genpac_util::{shared_list, DomainResolver, PublicSuffixList, SuffixOptions};
//!
//! // Process-wide bundled list
//! let resolver = DomainResolver::new(shared_list().unwrap());
//! assert_eq!(resolver.resolve("*.sub.example.com"), "example.com");
//! assert_eq!(resolver.resolve("http://www.example.co.uk/path?q=1"), "example.co.uk");
//! assert_eq!(resolver.resolve("nonsense-no-dot"), "");
//!
//! // Explicit list, private suffixes included
//! let psl = PublicSuffixList::bundled(SuffixOptions::new().with_only_icann(false)).unwrap();
//! let resolver = DomainResolver::new(psl);
//! assert_eq!(resolver.resolve("foo.blogspot.com"), "foo.blogspot.com");
//! ```
//!
//! # Rule Normalization
//!
//! | Rule | Host candidate | Domain |
//! |------|----------------|--------|
//! | `example.com` | `example.com` | `example.com` |
//! | `*.example.com` | `example.com` | `example.com` |
//! | `example.com/path` | `example.com` | `example.com` |
//! | `http://a.example.com/x` | `a.example.com` | `example.com` |
//! | `example.com%2Fpath` | `example.com` | `example.com` |
//! | `nonsense-no-dot` | | |

pub mod conv;
pub mod error;
pub mod file;
pub mod psl;
pub mod resource;
pub mod surmise;

// Re-export commonly used items
pub use conv::{conv_bool, conv_list, conv_lower, conv_path, replace_all};
pub use error::{Error, ErrorKind, IoOp, Result};
pub use file::{abspath, create_file, open_file, read_file, write_file};
pub use psl::{shared_list, PublicSuffixList, SuffixLookup, SuffixOptions, BUNDLED_LIST};
pub use resource::{open_resource, resource_data, resource_dir, resource_path, RESOURCE_DIR_ENV};
pub use surmise::{
    clear_asterisk, resolve_with, surmise_domain, surmise_host, DomainResolver, ResolverOptions,
    DEFAULT_CACHE_SIZE,
};
