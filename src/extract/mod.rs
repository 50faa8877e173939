//! Detail page extraction
//!
//! A detail page is reduced to [`DetailFields`]: a phone number recovered by
//! the [`PhoneChain`] plus, in resilient mode, the classification arrays
//! embedded in the page. [`assemble_record`] then merges those with what the
//! listing already knew about the business.
//!
//! Extraction never fails. Anything not found is simply absent.

pub mod embedded;
pub mod phone;
pub mod text;

pub use phone::{
    EmbeddedDataStrategy, PathQuery, PhoneChain, PhoneMatch, PhoneStrategy, SelectorQuery,
    SelectorStrategy, SelectorTarget, StructuralPathStrategy,
};

use crate::config::ListingMode;
use crate::crawler::CandidateBusiness;
use crate::output::{BusinessRecord, NOT_AVAILABLE};
use embedded::{BUSINESS_TYPES, CONSTRUCTION_SECTORS, PROVIDED_SERVICES};
use scraper::Html;

/// A parsed detail page
///
/// Keeps the raw markup next to the parsed tree; some strategies scan text,
/// others query elements.
pub struct DetailPage {
    raw: String,
    document: Html,
}

impl DetailPage {
    pub fn parse(html: &str) -> Self {
        Self {
            raw: html.to_string(),
            document: Html::parse_document(html),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn document(&self) -> &Html {
        &self.document
    }
}

impl std::fmt::Debug for DetailPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailPage")
            .field("len", &self.raw.len())
            .finish()
    }
}

/// Everything recovered from one detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    /// Phone number, if any strategy produced one
    pub phone: Option<String>,

    /// Which strategy produced the phone number
    pub phone_strategy: Option<&'static str>,

    pub company_type: Option<String>,
    pub market_services: Option<String>,
    pub trades_services: Option<String>,
}

impl DetailFields {
    /// Returns true if the page yielded nothing at all
    pub fn is_blank(&self) -> bool {
        self.phone.is_none()
            && self.company_type.is_none()
            && self.market_services.is_none()
            && self.trades_services.is_none()
    }
}

/// Runs the phone chain and, when configured, the embedded-array readers
#[derive(Debug)]
pub struct DetailExtractor {
    phone_chain: PhoneChain,
    read_embedded_arrays: bool,
}

impl DetailExtractor {
    /// Creates an extractor suited to a listing mode
    ///
    /// Structured listings already carry classification fields, so the
    /// embedded arrays are only read in resilient mode.
    pub fn new(mode: ListingMode) -> Self {
        Self::with_chain(PhoneChain::default(), mode == ListingMode::Resilient)
    }

    /// Creates an extractor with a custom phone chain
    pub fn with_chain(phone_chain: PhoneChain, read_embedded_arrays: bool) -> Self {
        Self {
            phone_chain,
            read_embedded_arrays,
        }
    }

    pub fn phone_chain(&self) -> &PhoneChain {
        &self.phone_chain
    }

    /// Extracts fields from detail page markup
    pub fn extract(&self, html: &str) -> DetailFields {
        let page = DetailPage::parse(html);
        self.extract_page(&page)
    }

    /// Extracts fields from an already parsed page
    pub fn extract_page(&self, page: &DetailPage) -> DetailFields {
        let phone = self.phone_chain.find(page);

        let mut fields = DetailFields {
            phone_strategy: phone.as_ref().map(|hit| hit.strategy),
            phone: phone.map(|hit| hit.value),
            ..Default::default()
        };

        if self.read_embedded_arrays {
            fields.company_type = BUSINESS_TYPES.render(page.raw());
            fields.market_services = CONSTRUCTION_SECTORS.render(page.raw());
            fields.trades_services = PROVIDED_SERVICES.render(page.raw());
        }

        fields
    }
}

/// Builds the record for a candidate whose detail page was fetched
///
/// If neither the detail page nor the listing provided a phone number or any
/// classification field, the result is the empty record. Otherwise a missing
/// phone becomes [`NOT_AVAILABLE`]; in resilient mode missing classification
/// fields do too, and the location is the upper-cased state code. Structured
/// mode passes listing fields through unchanged.
pub fn assemble_record(
    candidate: &CandidateBusiness,
    detail: DetailFields,
    mode: ListingMode,
    state_code: &str,
) -> BusinessRecord {
    let listing = &candidate.listing;

    let has_evidence = match mode {
        ListingMode::Structured => detail.phone.is_some() || listing.has_classification(),
        ListingMode::Resilient => !detail.is_blank(),
    };

    if !has_evidence {
        tracing::debug!(
            "No phone or classification for '{}', recording it as empty",
            candidate.name
        );
        return BusinessRecord::empty();
    }

    let phone = Some(detail.phone.unwrap_or_else(|| NOT_AVAILABLE.to_string()));

    match mode {
        ListingMode::Structured => BusinessRecord {
            name: Some(candidate.name.clone()),
            phone,
            location: listing.location.clone(),
            company_type: listing.company_type.clone(),
            market_services: listing.market_services.clone(),
            trades_services: listing.trades_services.clone(),
        },
        ListingMode::Resilient => BusinessRecord {
            name: Some(candidate.name.clone()),
            phone,
            location: Some(state_code.to_uppercase()),
            company_type: Some(detail.company_type.unwrap_or_else(not_available)),
            market_services: Some(detail.market_services.unwrap_or_else(not_available)),
            trades_services: Some(detail.trades_services.unwrap_or_else(not_available)),
        },
    }
}

/// Builds the record for a listing block that had no detail link
pub fn listing_only_record(candidate: &CandidateBusiness) -> BusinessRecord {
    let listing = &candidate.listing;
    BusinessRecord {
        name: Some(candidate.name.clone()),
        phone: Some(NOT_AVAILABLE.to_string()),
        location: listing.location.clone(),
        company_type: listing.company_type.clone(),
        market_services: listing.market_services.clone(),
        trades_services: listing.trades_services.clone(),
    }
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}
