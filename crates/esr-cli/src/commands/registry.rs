use std::io::{self, Write};

use anyhow::Result;
use esr_core::registry;
use tabwriter::TabWriter;

pub fn handle(states: bool) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    if states {
        writeln!(writer, "STATE\tNAME\tISO")?;
        for state in registry::state_list() {
            writeln!(writer, "{}\t{}\t{}", state.code, state.name, state.iso)?;
        }
    } else {
        writeln!(writer, "ISO\tNAME\tREGION\tEIA-930\tBALANCING AUTHORITIES")?;
        for iso in registry::iso_list() {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}",
                iso.id,
                iso.name,
                iso.region,
                iso.respondent,
                registry::ba_codes_for(iso.id).join(",")
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}
