//! Page descriptors and list filters.

/// Query parameters of a request, in insertion order.
pub type Query = Vec<(&'static str, String)>;

/// Page size used when none is given.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A page number (1-based) and a page size for list queries.
///
/// Out-of-range values are normalized on construction: pages start at 1 and a
/// zero size means [`DEFAULT_PAGE_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: u32,
    size: u32,
}

impl Pager {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size: if size == 0 { DEFAULT_PAGE_SIZE } else { size },
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// The pager for the following page.
    pub fn following(&self) -> Self {
        Self::new(self.page.saturating_add(1), self.size)
    }

    pub(crate) fn apply(&self, query: &mut Query) {
        query.push(("page", self.page.to_string()));
        query.push(("size", self.size.to_string()));
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Filter for farm listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FarmFilter {
    /// Owner threebot id; ignored unless positive.
    pub owner: Option<i64>,
    /// Exact farm name; ignored when empty.
    pub name: Option<String>,
}

impl FarmFilter {
    pub fn owned_by(mut self, owner: i64) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub(crate) fn apply(&self, query: &mut Query) {
        if let Some(owner) = self.owner.filter(|owner| *owner > 0) {
            query.push(("owner", owner.to_string()));
        }
        if let Some(name) = self.name.as_deref().filter(|name| !name.is_empty()) {
            query.push(("name", name.to_string()));
        }
    }
}

/// Filter for user listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserFilter {
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub(crate) fn apply(&self, query: &mut Query) {
        if let Some(name) = self.name.as_deref().filter(|name| !name.is_empty()) {
            query.push(("name", name.to_string()));
        }
        if let Some(email) = self.email.as_deref().filter(|email| !email.is_empty()) {
            query.push(("email", email.to_string()));
        }
    }
}

/// Filter for node listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFilter {
    pub farm: Option<i64>,
    pub country: Option<String>,
    pub city: Option<String>,
    /// Minimum free resources.
    pub cru: Option<u64>,
    pub mru: Option<u64>,
    pub sru: Option<u64>,
    pub hru: Option<u64>,
    /// Include hardware proofs in the records.
    pub proofs: bool,
}

impl NodeFilter {
    pub fn in_farm(mut self, farm: i64) -> Self {
        self.farm = Some(farm);
        self
    }

    pub fn in_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn in_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_cru(mut self, cru: u64) -> Self {
        self.cru = Some(cru);
        self
    }

    pub fn with_mru(mut self, mru: u64) -> Self {
        self.mru = Some(mru);
        self
    }

    pub fn with_sru(mut self, sru: u64) -> Self {
        self.sru = Some(sru);
        self
    }

    pub fn with_hru(mut self, hru: u64) -> Self {
        self.hru = Some(hru);
        self
    }

    pub fn with_proofs(mut self, proofs: bool) -> Self {
        self.proofs = proofs;
        self
    }

    pub(crate) fn apply(&self, query: &mut Query) {
        if let Some(farm) = self.farm {
            query.push(("farm", farm.to_string()));
        }
        if let Some(country) = self.country.as_deref().filter(|c| !c.is_empty()) {
            query.push(("country", country.to_string()));
        }
        if let Some(city) = self.city.as_deref().filter(|c| !c.is_empty()) {
            query.push(("city", city.to_string()));
        }
        for (key, value) in [
            ("cru", self.cru),
            ("mru", self.mru),
            ("sru", self.sru),
            ("hru", self.hru),
        ] {
            if let Some(value) = value {
                query.push((key, value.to_string()));
            }
        }
        if self.proofs {
            query.push(("proofs", "true".to_string()));
        }
    }
}
