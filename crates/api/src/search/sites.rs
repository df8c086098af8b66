//! Which store domains to search for a query.

/// US grocery chains.
const US_SITES: &[&str] = &[
    "walmart.com",
    "target.com",
    "costco.com",
    "instacart.com",
    "aldi.us",
];

/// Indian grocery marketplaces.
const IN_SITES: &[&str] = &["bigbasket.com", "flipkart.com"];

/// Every supported store.
const ALL_SITES: &[&str] = &[
    "amazon.com",
    "walmart.com",
    "target.com",
    "costco.com",
    "instacart.com",
    "aldi.us",
    "bigbasket.com",
    "flipkart.com",
];

/// Stores to search for a zipcode.
///
/// Six digits is an Indian PIN code, five digits a US ZIP code. Anything else,
/// including no zipcode, searches every supported store.
#[must_use]
pub fn sites_for_zipcode(zipcode: Option<&str>) -> &'static [&'static str] {
    let Some(zip) = zipcode.map(str::trim) else {
        return ALL_SITES;
    };
    let all_digits = !zip.is_empty() && zip.bytes().all(|b| b.is_ascii_digit());

    match zip.len() {
        6 if all_digits => IN_SITES,
        5 if all_digits => US_SITES,
        _ => ALL_SITES,
    }
}

/// Chooses site filters for each query.
///
/// Configured filters apply to every query; without them the zipcode decides.
#[derive(Debug, Clone, Default)]
pub struct SiteSelector {
    configured: Vec<String>,
}

impl SiteSelector {
    /// Create a selector. An empty list enables zipcode selection.
    #[must_use]
    pub const fn new(configured: Vec<String>) -> Self {
        Self { configured }
    }

    /// Site filters for one query.
    #[must_use]
    pub fn select(&self, zipcode: Option<&str>) -> Vec<String> {
        if self.configured.is_empty() {
            sites_for_zipcode(zipcode)
                .iter()
                .map(|s| (*s).to_owned())
                .collect()
        } else {
            self.configured.clone()
        }
    }
}
