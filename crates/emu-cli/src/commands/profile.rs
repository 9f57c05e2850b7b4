//! Profile command implementation

use crate::cli::{GlobalArgs, ProfileArgs};
use crate::output::OutputWriter;
use crate::output_types::{ProfileOutput, ProfileRow, PropertySeries, SeriesRow};
use crate::service::Service;
use anyhow::{Context, Result};
use emu_core::models::{Location, Property};

pub async fn execute(args: ProfileArgs, global: &GlobalArgs, output: &OutputWriter) -> Result<()> {
    let service = Service::new(global, None)?;
    let point = Location::new(args.point.lon, args.point.lat);

    // Reject unknown names before querying
    let property = args.property.as_deref().map(str::parse::<Property>).transpose()?;

    let profile = service
        .orchestrator
        .query_for_column_profile(point)
        .await
        .context("Profile query failed")?;

    let series = property.map(|p| PropertySeries {
        name: p.name().to_string(),
        values: profile.measurements_for_property(p),
    });

    if output.is_json() {
        return output.result(ProfileOutput { profile, property: series });
    }

    if profile.is_empty() {
        output.info(format!("No profile measurements at {}", point));
        return Ok(());
    }

    output.section(format!("Depth Profile at {}", point));
    output.kv("Measurements", profile.measurement_count());

    match series {
        Some(series) => {
            output.kv("Property", &series.name);
            output.table(
                series.values.into_iter().map(|(depth, value)| SeriesRow { depth, value }).collect(),
            );
        }
        None => output.table(
            profile
                .measurements()
                .map(|m| ProfileRow {
                    depth: m.depth,
                    cluster: m.cluster.0,
                    temperature: m.temperature,
                    salinity: m.salinity,
                    dissolved_oxygen: m.dissolved_oxygen,
                    phosphate: m.phosphate,
                    silicate: m.silicate,
                    nitrate: m.nitrate,
                })
                .collect(),
        ),
    }
    Ok(())
}
