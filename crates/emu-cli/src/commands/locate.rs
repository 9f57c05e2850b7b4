//! Locate command implementation

use crate::cli::{GlobalArgs, LocateArgs};
use crate::output::OutputWriter;
use crate::output_types::{LocateOutput, ObservationRow};
use crate::service::Service;
use anyhow::{Context, Result};
use emu_core::models::Location;

pub async fn execute(args: LocateArgs, global: &GlobalArgs, output: &OutputWriter) -> Result<()> {
    let service = Service::new(global, args.buffer_meters)?;
    let point = Location::new(args.point.lon, args.point.lat);
    let buffer_meters = service.orchestrator.settings().buffer_meters;

    let column = service
        .orchestrator
        .query_for_point(point)
        .await
        .context("Location query failed")?;

    if output.is_json() {
        return output.result(LocateOutput {
            query: point,
            buffer_meters,
            column: column.as_deref().cloned(),
        });
    }

    let Some(column) = column else {
        output.info(format!("No water column found within {} m of {}", buffer_meters, point));
        return Ok(());
    };

    output.section("Nearest Water Column");
    output.kv("Location", column.location());
    output.kv("Depth", format!("{} m", column.depth()));
    output.kv("Units", column.len());
    output.table(column.observations().map(ObservationRow::from).collect());
    Ok(())
}
