//! Site records and the identifier-indexed site table.

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use geo::Polygon;
use thiserror::Error;

use crate::error::{Result, SiteGraphError};

/// Encoded label value that marks a site as unlabeled in tabular inputs.
pub const DEFAULT_UNLABELED_SENTINEL: i64 = 9;

/// Stable identifier of a site.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SiteId(u64);

impl SiteId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    #[rustfmt::skip]
    pub const fn get(self) -> u64 { self.0 }
}

impl From<u64> for SiteId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Categorical class of a labeled site.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ClassLabel(u32);

impl ClassLabel {
    /// Wraps a raw class index.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Decodes a tabular label, treating `sentinel` and negative values as
    /// "unlabeled".
    ///
    /// # Examples
    /// ```
    /// use sitegraph_core::{ClassLabel, DEFAULT_UNLABELED_SENTINEL};
    ///
    /// assert_eq!(ClassLabel::decode(3, DEFAULT_UNLABELED_SENTINEL), Some(ClassLabel::new(3)));
    /// assert_eq!(ClassLabel::decode(9, DEFAULT_UNLABELED_SENTINEL), None);
    /// ```
    #[must_use]
    pub fn decode(raw: i64, sentinel: i64) -> Option<Self> {
        if raw == sentinel {
            return None;
        }
        u32::try_from(raw).ok().map(Self)
    }

    /// Returns the raw class index.
    #[must_use]
    #[rustfmt::skip]
    pub const fn get(self) -> u32 { self.0 }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Degree-of-urbanisation class attached to a site.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum UrbanizationClass {
    /// Densely populated area.
    City,
    /// Intermediate density area.
    TownOrSuburb,
    /// Thinly populated area.
    RuralArea,
}

impl UrbanizationClass {
    /// Returns the canonical snake-case name of the class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::TownOrSuburb => "town_or_suburb",
            Self::RuralArea => "rural_area",
        }
    }

    /// Maps the numeric DEGURBA level (`1`, `2`, `3`) onto a class.
    #[must_use]
    pub const fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(Self::City),
            2 => Some(Self::TownOrSuburb),
            3 => Some(Self::RuralArea),
            _ => None,
        }
    }
}

impl fmt::Display for UrbanizationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown urbanisation class.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("unknown urbanization class `{0}`")]
pub struct UnknownUrbanizationClass(pub String);

impl FromStr for UrbanizationClass {
    type Err = UnknownUrbanizationClass;

    fn from_str(value: &str) -> core::result::Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Some(class) = trimmed.parse::<i64>().ok().and_then(Self::from_level) {
            return Ok(class);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "city" => Ok(Self::City),
            "town_or_suburb" | "town" | "suburb" => Ok(Self::TownOrSuburb),
            "rural_area" | "rural" => Ok(Self::RuralArea),
            _ => Err(UnknownUrbanizationClass(value.to_owned())),
        }
    }
}

/// A single site: a polygon footprint with optional label and metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Site {
    id: SiteId,
    footprint: Polygon<f64>,
    label: Option<ClassLabel>,
    country_code: Option<Arc<str>>,
    urbanization: Option<UrbanizationClass>,
}

impl Site {
    /// Creates an unlabeled site without metadata.
    #[must_use]
    pub fn new(id: SiteId, footprint: Polygon<f64>) -> Self {
        Self {
            id,
            footprint,
            label: None,
            country_code: None,
            urbanization: None,
        }
    }

    /// Attaches a class label.
    #[must_use]
    pub fn with_label(mut self, label: Option<ClassLabel>) -> Self {
        self.label = label;
        self
    }

    /// Attaches an ISO country code.
    #[must_use]
    pub fn with_country_code(mut self, code: Option<impl Into<Arc<str>>>) -> Self {
        self.country_code = code.map(Into::into);
        self
    }

    /// Attaches an urbanisation class.
    #[must_use]
    pub fn with_urbanization(mut self, class: Option<UrbanizationClass>) -> Self {
        self.urbanization = class;
        self
    }

    /// Returns the site identifier.
    #[must_use]
    #[rustfmt::skip]
    pub fn id(&self) -> SiteId { self.id }

    /// Returns the footprint polygon.
    #[must_use]
    #[rustfmt::skip]
    pub fn footprint(&self) -> &Polygon<f64> { &self.footprint }

    /// Returns the class label, if any.
    #[must_use]
    #[rustfmt::skip]
    pub fn label(&self) -> Option<ClassLabel> { self.label }

    /// Returns `true` when the site carries a class label.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_labeled(&self) -> bool { self.label.is_some() }

    /// Returns the country code, if any.
    #[must_use]
    pub fn country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    /// Returns the urbanisation class, if any.
    #[must_use]
    #[rustfmt::skip]
    pub fn urbanization(&self) -> Option<UrbanizationClass> { self.urbanization }
}

/// Sites ordered by ascending identifier with O(1) lookup by id.
#[derive(Clone, Debug, Default)]
pub struct SiteTable {
    name: Arc<str>,
    sites: Vec<Site>,
    index: HashMap<SiteId, usize>,
}

impl SiteTable {
    /// Builds a table from `sites`, sorting them by identifier.
    ///
    /// # Errors
    /// Returns [`SiteGraphError::DuplicateSiteId`] when two sites share an id.
    pub fn new(name: impl Into<Arc<str>>, mut sites: Vec<Site>) -> Result<Self> {
        sites.sort_unstable_by_key(Site::id);
        if let Some(pair) = sites.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(SiteGraphError::DuplicateSiteId { id: pair[0].id });
        }
        let index = sites
            .iter()
            .enumerate()
            .map(|(position, site)| (site.id, position))
            .collect();
        Ok(Self {
            name: name.into(),
            sites,
            index,
        })
    }

    /// Returns the table name used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Returns the number of sites.
    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.sites.len() }

    /// Returns `true` when the table holds no sites.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.sites.is_empty() }

    /// Looks up a site by identifier.
    #[must_use]
    pub fn get(&self, id: SiteId) -> Option<&Site> {
        self.index.get(&id).map(|&position| &self.sites[position])
    }

    /// Returns `true` when `id` names a site in the table.
    #[must_use]
    pub fn contains(&self, id: SiteId) -> bool {
        self.index.contains_key(&id)
    }

    /// Returns `true` when `id` names a labeled site in the table.
    #[must_use]
    pub fn is_labeled(&self, id: SiteId) -> bool {
        self.get(id).is_some_and(Site::is_labeled)
    }

    /// Returns the sites in ascending identifier order.
    #[must_use]
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Iterates over the sites in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter()
    }

    /// Returns a new table containing only the sites accepted by `keep`.
    pub(crate) fn retain(&self, mut keep: impl FnMut(&Site) -> bool) -> Self {
        let sites: Vec<Site> = self.sites.iter().filter(|site| keep(site)).cloned().collect();
        let index = sites
            .iter()
            .enumerate()
            .map(|(position, site)| (site.id, position))
            .collect();
        Self {
            name: Arc::clone(&self.name),
            sites,
            index,
        }
    }
}
