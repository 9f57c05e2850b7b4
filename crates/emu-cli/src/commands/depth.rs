//! Depth command implementation

use crate::cli::{DepthArgs, GlobalArgs};
use crate::output::OutputWriter;
use crate::output_types::{DepthItem, DepthOutput};
use crate::service::Service;
use anyhow::{Context, Result};
use emu_store::{DepthLayer, DepthLayerCache};

pub async fn execute(args: DepthArgs, global: &GlobalArgs, output: &OutputWriter) -> Result<()> {
    let service = Service::new(global, None)?;
    let orchestrator = &service.orchestrator;

    let mut requests = Vec::with_capacity(args.values.len());
    for value in args.values {
        let bucket = DepthLayerCache::bucket(value);
        let layer = orchestrator
            .query_depth_layer(value)
            .await
            .with_context(|| format!("Depth layer request for {} failed", value))?;

        let (layer, features) = match layer {
            DepthLayer::Surface => ("surface".to_string(), "-".to_string()),
            DepthLayer::Filtered { handle, definition_expression } => {
                (definition_expression, handle.feature_count.to_string())
            }
        };
        requests.push(DepthItem { value, bucket: bucket.value(), layer, features });
    }

    let depth_layers = orchestrator.depth_layers();
    let visibility = depth_layers.visibility();
    let cache = depth_layers.stats();

    if output.is_json() {
        return output.result(DepthOutput { requests, visibility, cache });
    }

    output.section("Depth Layers");
    output.table(requests);
    output.kv("Surface visible", visibility.surface_visible);
    output.kv("Depth layer visible", visibility.depth_layer_visible);
    if let Some(expression) = &visibility.definition_expression {
        output.kv("Filter", expression);
    }
    output.kv(
        "Cache",
        format!(
            "{} hits, {} misses, {:.0}% hit rate",
            cache.hits,
            cache.misses,
            cache.hit_rate() * 100.0
        ),
    );
    Ok(())
}
