use crate::models::CatalogEntry;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Role choices offered by the browser, `all` first.
pub const ROLES: [&str; 7] = ["all", "Assassin", "Fighter", "Mage", "Marksman", "Support", "Tank"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role {0:?} (expected one of: {roles})", roles = ROLES.join(", "))]
pub struct UnknownRole(pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RoleFilter {
    #[default]
    All,
    Tag(String),
}

impl RoleFilter {
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        match self {
            RoleFilter::All => true,
            RoleFilter::Tag(tag) => entry.has_tag(tag),
        }
    }
}

impl FromStr for RoleFilter {
    type Err = UnknownRole;

    /// Case-insensitive match against [`ROLES`]; empty means `all`. Tags keep
    /// the catalog's capitalization.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(RoleFilter::All);
        }
        match ROLES.iter().find(|r| r.eq_ignore_ascii_case(s)) {
            Some(&"all") => Ok(RoleFilter::All),
            Some(role) => Ok(RoleFilter::Tag(role.to_string())),
            None => Err(UnknownRole(s.to_string())),
        }
    }
}

impl fmt::Display for RoleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleFilter::All => f.write_str("all"),
            RoleFilter::Tag(tag) => f.write_str(tag),
        }
    }
}

/// Stable projection: entries whose role matches and whose name or title
/// contains `search` (case-insensitive), in their original order.
pub fn filter<'a>(
    entries: &'a [CatalogEntry],
    search: &str,
    role: &RoleFilter,
) -> Vec<&'a CatalogEntry> {
    let needle = search.to_lowercase();
    entries
        .iter()
        .filter(|e| role.matches(e))
        .filter(|e| {
            needle.is_empty()
                || e.display_name.to_lowercase().contains(&needle)
                || e.title.to_lowercase().contains(&needle)
        })
        .collect()
}
