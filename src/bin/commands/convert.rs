use std::path::Path;

use anyhow::Result;

use bio_convert::convert::Conversion;

use crate::commands::run_with_spinner;

/// Plans the conversion, then loads and writes under a spinner each.
pub fn run(input: &Path, format: Option<&str>) -> Result<()> {
    let plan = Conversion::plan(input, format)?;

    let structure = run_with_spinner(&format!("Reading {} input", plan.source), || {
        Ok(plan.load()?)
    })?;

    run_with_spinner(&format!("Writing {} output", plan.target), || {
        Ok(plan.write(&structure)?)
    })?;

    Ok(())
}
