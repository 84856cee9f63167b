use crate::results::SweepResultTable;

pub const RESULT_COLUMNS: [&str; 14] = [
    "experiment",
    "experiment type",
    "co-simulation platform",
    "core type",
    "status",
    "federates",
    "messages",
    "bytes",
    "initialization time (cpu)",
    "execution time (cpu)",
    "closing time (cpu)",
    "initialization time (wall)",
    "execution time (wall)",
    "closing time (wall)",
];

pub(crate) fn export_to_csv_impl(
    table: &SweepResultTable,
    writer: impl std::io::Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(RESULT_COLUMNS)?;

    for row in table.rows() {
        wtr.write_record(&[
            row.experiment.to_string(),
            row.experiment_type.label().to_string(),
            row.platform.label().to_string(),
            row.core_type.clone(),
            row.status.as_str().to_string(),
            row.federates.to_string(),
            row.messages.to_string(),
            row.bytes.to_string(),
            row.timings.init_cpu.to_string(),
            row.timings.exec_cpu.to_string(),
            row.timings.close_cpu.to_string(),
            row.timings.init_wall.to_string(),
            row.timings.exec_wall.to_string(),
            row.timings.close_wall.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
