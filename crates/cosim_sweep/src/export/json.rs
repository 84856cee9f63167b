use std::io::Write;

use crate::results::SweepResultTable;

pub(crate) fn export_to_json_impl(
    table: &SweepResultTable,
    mut writer: impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer_pretty(&mut writer, table)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
