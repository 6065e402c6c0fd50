use std::collections::BTreeMap;

use serde::Serialize;

use crate::db::Building;

/// Selectable endpoints, grouped for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocationCatalog {
    /// Category to labels, both sorted; labels unique within a category.
    pub groups: BTreeMap<String, Vec<String>>,
    /// Label to floor. When a label exists on several floors the last row in
    /// store order wins.
    pub floors: BTreeMap<String, i32>,
}

impl LocationCatalog {
    pub fn label_count(&self) -> usize {
        self.floors.len()
    }
}

/// Build the location catalog for a building.
pub fn list_locations(building: &Building) -> LocationCatalog {
    let mut catalog = LocationCatalog::default();

    for location in building.locations() {
        catalog
            .groups
            .entry(location.category.clone())
            .or_default()
            .push(location.label.clone());
        catalog.floors.insert(location.label.clone(), location.floor);
    }

    for labels in catalog.groups.values_mut() {
        labels.sort();
        labels.dedup();
    }

    catalog
}
