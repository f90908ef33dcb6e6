//! Catalog collaborator interface.
//!
//! The harvester does not own the catalog. It only needs to look up and
//! write packages and groups; [`InMemoryCatalog`] backs the command line
//! and the tests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{HarvesterError, Result};
use crate::names::NameSanitizer;
use crate::normalize::NormalizedRecord;

/// A package as the catalog stores it.
pub type Package = NormalizedRecord;

/// A catalog group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub title: String,
}

/// Operations the import stage calls on the catalog.
///
/// `*_show` returns `Ok(None)` for a missing entry; `Err` is reserved for the
/// catalog itself failing.
pub trait Catalog {
    fn package_show(&self, id: &str) -> Result<Option<Package>>;

    fn package_create(&mut self, package: &Package) -> Result<Package>;

    fn package_update(&mut self, package: &Package) -> Result<Package>;

    fn group_show(&self, name: &str) -> Result<Option<Group>>;

    fn group_create(&mut self, name: &str, title: &str) -> Result<Group>;
}

/// Resolve group titles to group ids, creating missing groups.
///
/// Group names are derived from the titles with the sanitizer, so calling
/// this twice with the same titles creates nothing the second time.
pub fn find_or_create_groups(
    catalog: &mut dyn Catalog,
    sanitizer: &dyn NameSanitizer,
    titles: &[String],
) -> Result<Vec<String>> {
    let mut ids = Vec::with_capacity(titles.len());
    for title in titles {
        let name = sanitizer.munge_name(title);
        let group = match catalog.group_show(&name)? {
            Some(group) => group,
            None => {
                let group = catalog.group_create(&name, title)?;
                tracing::info!(group = %group.name, "created group");
                group
            }
        };
        if !ids.contains(&group.id) {
            ids.push(group.id);
        }
    }
    Ok(ids)
}

/// Catalog held in memory.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    packages: BTreeMap<String, Package>,
    groups: BTreeMap<String, Group>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a harvest source as a package owned by `owner_org`.
    pub fn add_source(&mut self, source_id: &str, owner_org: Option<&str>) {
        let mut package = Package::new(source_id, source_id);
        package.owner_org = owner_org.map(str::to_string);
        self.packages.insert(source_id.to_string(), package);
    }

    /// All packages, ordered by id.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// All groups, ordered by name.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }
}

impl Catalog for InMemoryCatalog {
    fn package_show(&self, id: &str) -> Result<Option<Package>> {
        Ok(self.packages.get(id).cloned())
    }

    fn package_create(&mut self, package: &Package) -> Result<Package> {
        if self.packages.contains_key(&package.id) {
            return Err(HarvesterError::Catalog {
                action: "package_create",
                message: format!("package '{}' already exists", package.id),
            });
        }
        self.packages.insert(package.id.clone(), package.clone());
        Ok(package.clone())
    }

    fn package_update(&mut self, package: &Package) -> Result<Package> {
        match self.packages.get_mut(&package.id) {
            Some(existing) => {
                *existing = package.clone();
                Ok(package.clone())
            }
            None => Err(HarvesterError::Catalog {
                action: "package_update",
                message: format!("package '{}' not found", package.id),
            }),
        }
    }

    fn group_show(&self, name: &str) -> Result<Option<Group>> {
        Ok(self.groups.get(name).cloned())
    }

    fn group_create(&mut self, name: &str, title: &str) -> Result<Group> {
        let group = Group {
            id: name.to_string(),
            name: name.to_string(),
            title: title.to_string(),
        };
        self.groups.insert(name.to_string(), group.clone());
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::CkanNames;

    #[test]
    fn test_find_or_create_groups_is_idempotent() {
        let mut catalog = InMemoryCatalog::new();
        let titles = vec!["Ocean Physics".to_string(), "ice".to_string()];

        let first = find_or_create_groups(&mut catalog, &CkanNames, &titles).unwrap();
        let second = find_or_create_groups(&mut catalog, &CkanNames, &titles).unwrap();

        assert_eq!(first, vec!["ocean-physics", "ice"]);
        assert_eq!(first, second);
        assert_eq!(catalog.groups().count(), 2);
        assert_eq!(
            catalog.group_show("ocean-physics").unwrap().unwrap().title,
            "Ocean Physics"
        );
    }

    #[test]
    fn test_titles_with_same_name_share_a_group() {
        let mut catalog = InMemoryCatalog::new();
        let titles = vec!["Sea Ice".to_string(), "sea ice".to_string()];
        let ids = find_or_create_groups(&mut catalog, &CkanNames, &titles).unwrap();
        assert_eq!(ids, vec!["sea-ice"]);
    }

    #[test]
    fn test_package_create_then_update() {
        let mut catalog = InMemoryCatalog::new();
        let mut package = Package::new("oai-x-1", "oai-x-1");
        assert!(catalog.package_update(&package).is_err());

        catalog.package_create(&package).unwrap();
        assert!(catalog.package_create(&package).is_err());

        package.title = Some("Updated".to_string());
        catalog.package_update(&package).unwrap();
        assert_eq!(
            catalog.package_show("oai-x-1").unwrap().unwrap().title.as_deref(),
            Some("Updated")
        );
    }

    #[test]
    fn test_source_owner_org() {
        let mut catalog = InMemoryCatalog::new();
        catalog.add_source("source-1", Some("met-norway"));
        let source = catalog.package_show("source-1").unwrap().unwrap();
        assert_eq!(source.owner_org.as_deref(), Some("met-norway"));
        assert!(catalog.package_show("source-2").unwrap().is_none());
    }
}
