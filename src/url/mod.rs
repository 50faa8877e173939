//! URL handling module for Tradeline
//!
//! This module builds listing-page URLs, resolves detail links and derives
//! business names from detail URL slugs.

mod listing;
mod slug;

pub use listing::{listing_url, normalize_state_code, resolve_link};
pub use slug::{name_from_detail_url, title_case};
