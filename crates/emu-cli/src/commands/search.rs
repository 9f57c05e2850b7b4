//! Search command implementation

use crate::cli::{GlobalArgs, SearchArgs};
use crate::output::OutputWriter;
use crate::output_types::{ObservationRow, SearchOutput};
use crate::service::Service;
use anyhow::{Context, Result};

pub async fn execute(args: SearchArgs, global: &GlobalArgs, output: &OutputWriter) -> Result<()> {
    let service = Service::new(global, None)?;
    let address = args.address.join(" ");

    let found = service
        .orchestrator
        .geocode_and_query(&address)
        .await
        .with_context(|| format!("Search for '{}' failed", address))?;

    if output.is_json() {
        let (candidate, column) = match found {
            Some(m) => (Some(m.candidate), m.column.as_deref().cloned()),
            None => (None, None),
        };
        return output.result(SearchOutput { address, candidate, column });
    }

    let Some(found) = found else {
        output.info(format!("No places match '{}'", address));
        return Ok(());
    };

    output.kv("Place", &found.candidate.label);
    output.kv("Location", found.candidate.location);

    match found.column {
        Some(column) => {
            output.section("Nearest Water Column");
            output.kv("Location", column.location());
            output.kv("Depth", format!("{} m", column.depth()));
            output.table(column.observations().map(ObservationRow::from).collect());
        }
        None => output.info("No water column found near this place"),
    }
    Ok(())
}
