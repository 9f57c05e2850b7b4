use emu_core::models::{Location, LocationKey, Observation, WaterColumn};
use std::collections::HashMap;

/// Water columns keyed by exact location, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct ColumnsByLocation {
    index: HashMap<LocationKey, usize>,
    columns: Vec<WaterColumn>,
}

impl ColumnsByLocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observation to the column at its location, creating the column
    /// on first sight
    pub fn insert(&mut self, observation: Observation) {
        let key = observation.location.key();
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.columns.push(WaterColumn::new(observation.location));
                self.index.insert(key, self.columns.len() - 1);
                self.columns.len() - 1
            }
        };
        self.columns[slot].add_observation(observation);
    }

    pub fn get(&self, location: &Location) -> Option<&WaterColumn> {
        self.index.get(&location.key()).map(|&slot| &self.columns[slot])
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns in the order their locations were first encountered
    pub fn iter(&self) -> impl Iterator<Item = &WaterColumn> {
        self.columns.iter()
    }

    pub fn into_columns(self) -> Vec<WaterColumn> {
        self.columns
    }
}

impl FromIterator<Observation> for ColumnsByLocation {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        let mut columns = ColumnsByLocation::new();
        for observation in iter {
            columns.insert(observation);
        }
        columns
    }
}

/// Group observations into one water column per distinct location.
///
/// Grouping uses exact coordinate equality. Observations repeating a top
/// depth already present in their column are coalesced.
pub fn aggregate(observations: impl IntoIterator<Item = Observation>) -> ColumnsByLocation {
    let columns: ColumnsByLocation = observations.into_iter().collect();
    tracing::debug!(columns = columns.len(), "Aggregated observations into water columns");
    columns
}
