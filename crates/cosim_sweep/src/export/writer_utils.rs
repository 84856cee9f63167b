use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

/// Create (or truncate) `path`, creating its parent directories first.
pub(crate) fn create_output_file(
    path: impl AsRef<Path>,
) -> Result<BufWriter<File>, Box<dyn std::error::Error>> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}
