use crate::analysis::AnalysisSwitch;
use crate::error::Result;
use std::path::Path;

/// Run the switches subcommand: print the effective analysis switch
pub fn switches(config: Option<&Path>, overrides: &[String]) -> Result<()> {
    let switch = AnalysisSwitch::from_sources(config, overrides)?;
    print!("{}", switch);
    Ok(())
}
