use anyhow::Result;
use arena_core::generate_roster;

use crate::output;

pub fn cmd_roster(brief: &str, format: &str) -> Result<()> {
    let roster = generate_roster(brief);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&roster)?);
    } else {
        output::print_roster(&roster);
    }
    Ok(())
}
