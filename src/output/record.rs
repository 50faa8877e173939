//! Business record definitions
//!
//! Every row emitted by a crawl has the same fixed shape: six optional text
//! fields rendered in a fixed column order.

/// Sentinel used when a field was looked for but could not be recovered
pub const NOT_AVAILABLE: &str = "Not Available";

/// Column headers, in output order
pub const COLUMNS: [&str; 6] = [
    "Business Name",
    "Phone Number",
    "Location",
    "Company Type",
    "Market and Services",
    "Trades and Services",
];

/// A single business row
///
/// A record whose six fields are all `None` is an *empty record*. The crawl
/// emits those as visible gap markers (see [`crate::state::TerminationPolicy`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessRecord {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub company_type: Option<String>,
    pub market_services: Option<String>,
    pub trades_services: Option<String>,
}

impl BusinessRecord {
    /// Creates the fully-null placeholder row
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if every field is unset
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(Option::is_none)
    }

    /// Returns true if the phone field holds a real number rather than the sentinel
    pub fn has_phone(&self) -> bool {
        self.phone
            .as_deref()
            .is_some_and(|phone| phone != NOT_AVAILABLE)
    }

    /// Returns the fields in column order
    pub fn fields(&self) -> [Option<&str>; 6] {
        [
            self.name.as_deref(),
            self.phone.as_deref(),
            self.location.as_deref(),
            self.company_type.as_deref(),
            self.market_services.as_deref(),
            self.trades_services.as_deref(),
        ]
    }

    /// Renders the record as a fixed six-cell row; unset fields become empty cells
    pub fn to_row(&self) -> [String; 6] {
        self.fields().map(|field| field.unwrap_or_default().to_string())
    }
}
