use super::*;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// A disjoint, exhaustive cover of the unit store by supergeos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition(Vec<Supergeo>);

impl Partition {
    /// Build supergeos from one cluster label per unit.
    ///
    /// Labels are renumbered in order of first appearance, so the output
    /// does not depend on how the clustering routine happened to name them.
    pub fn from_labels(units: &Units, labels: &[usize]) -> Self {
        debug_assert!(labels.len() == units.len());
        let mut order = BTreeMap::<usize, usize>::new();
        let mut groups = Vec::<Vec<&GeoUnit>>::new();
        for (unit, label) in units.units().iter().zip(labels.iter()) {
            let next = order.len();
            let slot = *order.entry(*label).or_insert(next);
            if slot == groups.len() {
                groups.push(Vec::new());
            }
            groups[slot].push(unit);
        }
        groups
            .iter()
            .enumerate()
            .map(|(i, members)| Supergeo::aggregate(format!("sg_{}", i), members, units.features()))
            .collect::<Vec<_>>()
            .into()
    }
    pub fn supergeos(&self) -> &[Supergeo] {
        &self.0
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// true iff every unit appears in exactly one supergeo
    pub fn check(&self, units: &Units) -> bool {
        let expected = units.units().iter().map(|u| u.id()).collect::<BTreeSet<_>>();
        let mut seen = BTreeSet::new();
        self.0
            .iter()
            .flat_map(|sg| sg.units().iter())
            .all(|id| expected.contains(id.as_str()) && seen.insert(id.as_str()))
            && seen.len() == expected.len()
    }
    /// unit ids covered by the given supergeo indices, sorted
    pub fn expand(&self, indices: &[usize]) -> Vec<String> {
        let mut ids = indices
            .iter()
            .filter_map(|i| self.0.get(*i))
            .flat_map(|sg| sg.units().iter().cloned())
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }
    /// complement of `indices` within this partition
    pub fn complement(&self, indices: &[usize]) -> Vec<usize> {
        let chosen = indices.iter().collect::<BTreeSet<_>>();
        (0..self.len()).filter(|i| !chosen.contains(i)).collect()
    }
}

impl From<Vec<Supergeo>> for Partition {
    fn from(supergeos: Vec<Supergeo>) -> Self {
        Self(supergeos)
    }
}

impl From<Partition> for Vec<Supergeo> {
    fn from(partition: Partition) -> Self {
        partition.0
    }
}
