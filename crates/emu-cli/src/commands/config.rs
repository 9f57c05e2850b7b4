//! Config command implementation

use crate::cli::GlobalArgs;
use crate::output::OutputWriter;
use crate::output_types::ConfigRow;
use crate::service::load_config;
use anyhow::Result;

pub fn execute(global: &GlobalArgs, output: &OutputWriter) -> Result<()> {
    let config = load_config(global, None)?;

    let mut rows: Vec<ConfigRow> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigRow { key, value, source: format!("{:?}", source) })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        output.result(&rows)?;
    } else {
        output.section("Effective Configuration");
        output.table(rows);
    }
    Ok(())
}
