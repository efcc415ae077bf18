//! Zone name → zone ID mapping built from one zone listing

use crate::error::{Error, Result};
use crate::traits::Zone;
use std::collections::BTreeMap;

/// Account zones keyed by normalized name
///
/// Built once from a provider listing and reused for every domain of a run.
#[derive(Debug, Clone, Default)]
pub struct ZoneIndex {
    by_name: BTreeMap<String, String>,
}

impl ZoneIndex {
    /// Build the index; on duplicate names the first listed zone is kept
    pub fn from_zones(zones: impl IntoIterator<Item = Zone>) -> Self {
        let mut by_name = BTreeMap::new();
        for zone in zones {
            by_name
                .entry(crate::domain::normalize(&zone.name))
                .or_insert(zone.id);
        }
        Self { by_name }
    }

    /// Look up the zone for a registrable root domain
    ///
    /// A miss reports every zone name the account owns, sorted.
    pub fn lookup(&self, root_domain: &str) -> Result<Zone> {
        let name = crate::domain::normalize(root_domain);
        match self.by_name.get(&name) {
            Some(id) => Ok(Zone {
                name,
                id: id.clone(),
            }),
            None => Err(Error::zone_not_managed(name, self.names())),
        }
    }

    /// All zone names, sorted
    pub fn names(&self) -> Vec<String> {
        self.by_name.keys().cloned().collect()
    }

    /// Number of zones
    pub(crate) fn len(&self) -> usize {
        self.by_name.len()
    }
}
