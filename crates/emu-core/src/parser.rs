//! Conversion of raw feature records into typed domain values.
//!
//! Required fields (cluster id, top depth, thickness, location; for profile
//! readings the cluster id and depth) must parse or the record is rejected
//! with [`EmuError::MalformedRecord`]. Batch helpers skip rejected records and
//! keep going.

use crate::config::FieldNames;
use crate::error::{EmuError, Result};
use crate::models::{
    ClusterDescriptor, ClusterId, ClusterStat, Location, Measurements, Observation,
    ProfileMeasurement, Property, RawRecord,
};

/// Outcome of parsing a batch of records
#[derive(Debug, Clone)]
pub struct ParsedBatch<T> {
    pub items: Vec<T>,
    pub skipped: usize,
}

impl<T> ParsedBatch<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Record parser configured with the attribute names of the source tables
#[derive(Debug, Clone, Default)]
pub struct RecordParser {
    fields: FieldNames,
}

impl RecordParser {
    pub fn new(fields: FieldNames) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &FieldNames {
        &self.fields
    }

    /// Build an observation from a mesh-cluster record
    pub fn parse_observation(&self, record: &RawRecord) -> Result<Observation> {
        let f = &self.fields;

        let id = required_int(record, &f.cluster_id)?;
        let id = u32::try_from(id)
            .map_err(|_| EmuError::malformed(&f.cluster_id, format!("is negative: {}", id)))?;

        let (physical_summary, nutrient_summary) =
            ClusterDescriptor::split_summary(&record.text(&f.cluster_name).unwrap_or_default());

        let cluster = ClusterDescriptor {
            id: ClusterId(id),
            physical_summary,
            nutrient_summary,
            geomorphology_base: record.text(&f.geomorphology_base).unwrap_or_default(),
            geomorphology_features: record.text(&f.geomorphology_features).unwrap_or_default(),
        };

        let top = required_int(record, &f.top_depth)?;
        let top_depth = u32::try_from(top)
            .map_err(|_| EmuError::malformed(&f.top_depth, format!("must be >= 0, got {}", top)))?;

        let thickness = required_int(record, &f.thickness)?;
        let thickness = u32::try_from(thickness)
            .ok()
            .filter(|t| *t > 0)
            .ok_or_else(|| {
                EmuError::malformed(&f.thickness, format!("must be > 0, got {}", thickness))
            })?;

        let location = self.location(record)?;

        let mut measurements = Measurements::default();
        for property in Property::ALL {
            measurements.set(property, optional_float(record, f.property(property)));
        }

        Ok(Observation { cluster, top_depth, thickness, location, measurements })
    }

    /// Build per-cluster statistics from a summary-table row
    pub fn parse_cluster_stat(&self, record: &RawRecord) -> Result<ClusterStat> {
        let f = &self.fields;

        let id = required_int(record, &f.cluster_id)?;
        let id = u32::try_from(id)
            .map_err(|_| EmuError::malformed(&f.cluster_id, format!("is negative: {}", id)))?;

        let mut stat = ClusterStat::empty(ClusterId(id));
        for property in Property::ALL {
            let column = f.property(property);
            let slot = stat.get_mut(property);
            slot.min = optional_float(record, &format!("{}{}", f.min_prefix, column));
            slot.max = optional_float(record, &format!("{}{}", f.max_prefix, column));
            slot.mean = optional_float(record, &format!("{}{}", f.mean_prefix, column));
        }

        Ok(stat)
    }

    /// Build a profile reading from a mesh-point record.
    ///
    /// Property values that are missing or unreadable become `0.0`; chart
    /// consumers of depth profiles expect a number at every depth.
    pub fn parse_profile_measurement(&self, record: &RawRecord) -> Result<ProfileMeasurement> {
        let f = &self.fields;

        let id = required_int(record, &f.cluster_id)?;
        let id = u32::try_from(id)
            .map_err(|_| EmuError::malformed(&f.cluster_id, format!("is negative: {}", id)))?;

        let depth = required_float(record, &f.top_depth)?;

        let value = |property: Property| -> f64 {
            record
                .text(f.property(property))
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(0.0)
        };

        Ok(ProfileMeasurement {
            depth,
            cluster: ClusterId(id),
            temperature: value(Property::Temperature),
            salinity: value(Property::Salinity),
            dissolved_oxygen: value(Property::DissolvedOxygen),
            phosphate: value(Property::Phosphate),
            silicate: value(Property::Silicate),
            nitrate: value(Property::Nitrate),
        })
    }

    pub fn parse_observations(&self, records: &[RawRecord]) -> ParsedBatch<Observation> {
        parse_all(records, "observation", |r| self.parse_observation(r))
    }

    pub fn parse_cluster_stats(&self, records: &[RawRecord]) -> ParsedBatch<ClusterStat> {
        parse_all(records, "cluster statistic", |r| self.parse_cluster_stat(r))
    }

    pub fn parse_profile_measurements(
        &self,
        records: &[RawRecord],
    ) -> ParsedBatch<ProfileMeasurement> {
        parse_all(records, "profile measurement", |r| self.parse_profile_measurement(r))
    }

    /// Location from the point attributes, falling back to the record geometry
    fn location(&self, record: &RawRecord) -> Result<Location> {
        let f = &self.fields;
        match (record.text(&f.point_x), record.text(&f.point_y)) {
            (Some(_), Some(_)) => {
                let x = required_float(record, &f.point_x)?;
                let y = required_float(record, &f.point_y)?;
                Ok(Location::new(x, y))
            }
            _ => record.geometry.ok_or_else(|| {
                EmuError::malformed(
                    format!("{}/{}", f.point_x, f.point_y),
                    "is missing and the record has no geometry",
                )
            }),
        }
    }
}

/// Parse every record, logging and skipping the malformed ones
fn parse_all<T>(
    records: &[RawRecord],
    kind: &str,
    parse: impl Fn(&RawRecord) -> Result<T>,
) -> ParsedBatch<T> {
    let mut items = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for (index, record) in records.iter().enumerate() {
        match parse(record) {
            Ok(item) => items.push(item),
            Err(e) => {
                skipped += 1;
                tracing::warn!(index, kind, error = %e, "Skipping malformed record");
            }
        }
    }

    if skipped > 0 {
        tracing::debug!(kind, parsed = items.len(), skipped, "Parsed record batch");
    }

    ParsedBatch { items, skipped }
}

fn required_int(record: &RawRecord, field: &str) -> Result<i64> {
    let text = record.text(field).ok_or_else(|| EmuError::malformed(field, "is missing"))?;

    if let Ok(value) = text.parse::<i64>() {
        return Ok(value);
    }

    // Integer columns sometimes arrive rendered as doubles ("50.0")
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => Ok(value as i64),
        _ => Err(EmuError::malformed(field, format!("is not an integer: '{}'", text))),
    }
}

fn required_float(record: &RawRecord, field: &str) -> Result<f64> {
    let text = record.text(field).ok_or_else(|| EmuError::malformed(field, "is missing"))?;
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EmuError::malformed(field, format!("is not a number: '{}'", text)))
}

fn optional_float(record: &RawRecord, field: &str) -> Option<f64> {
    let text = record.text(field)?;
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            tracing::warn!(field, value = %text, "Ignoring unreadable optional value");
            None
        }
    }
}
