//! URL handling module for Topic-Harvester
//!
//! This module provides URL canonicalization, fingerprinting, and link
//! resolution against the page a link was found on.

mod fingerprint;
mod links;
mod normalize;

pub use fingerprint::fingerprint_url;
pub use links::resolve_link;
pub use normalize::normalize_url;
