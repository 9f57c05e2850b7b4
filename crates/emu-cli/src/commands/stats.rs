//! Stats command implementation

use crate::cli::{GlobalArgs, StatsArgs};
use crate::output::{opt, OutputWriter};
use crate::output_types::{ClusterStatRow, ExtremaItem, ExtremaRow, StatsOutput};
use crate::service::Service;
use anyhow::{bail, Context, Result};
use emu_core::models::{ClusterId, Property};
use emu_store::LoadOutcome;

pub async fn execute(args: StatsArgs, global: &GlobalArgs, output: &OutputWriter) -> Result<()> {
    let service = Service::new(global, None)?;
    let outcome = service
        .orchestrator
        .query_statistics()
        .await
        .context("Statistics query failed")?;

    let statistics = service.orchestrator.statistics();
    let (loaded_now, skipped) = match outcome {
        LoadOutcome::Loaded { skipped, .. } => (true, skipped),
        LoadOutcome::AlreadyLoaded => (false, 0),
    };

    if skipped > 0 {
        output.warning(format!("{} summary rows could not be parsed", skipped));
    }

    let cluster = match args.cluster {
        Some(id) => match statistics.stat_for(ClusterId(id)) {
            Some(stat) => Some(stat),
            None => bail!("No statistics for EMU {}", id),
        },
        None => None,
    };

    let extrema: Vec<ExtremaItem> = if cluster.is_some() {
        Vec::new()
    } else {
        Property::ALL
            .into_iter()
            .map(|p| ExtremaItem { property: p.name().to_string(), extrema: statistics.extrema(p) })
            .collect()
    };

    if output.is_json() {
        return output.result(StatsOutput {
            loaded_now,
            clusters: statistics.len(),
            skipped,
            extrema,
            cluster,
        });
    }

    output.kv("Clusters", statistics.len());
    match cluster {
        Some(stat) => {
            output.section(format!("EMU {}", stat.id));
            output.table(
                Property::ALL
                    .into_iter()
                    .map(|p| {
                        let s = stat.get(p);
                        ClusterStatRow {
                            property: p.name().to_string(),
                            min: opt(s.min),
                            max: opt(s.max),
                            mean: opt(s.mean),
                        }
                    })
                    .collect(),
            );
        }
        None => {
            output.section("Global Extrema");
            output.table(
                extrema
                    .into_iter()
                    .map(|item| ExtremaRow {
                        property: item.property,
                        min: opt(item.extrema.min),
                        max: opt(item.extrema.max),
                    })
                    .collect(),
            );
        }
    }
    Ok(())
}
