//! Participant configuration documents.
//!
//! A document is a [`ParticipantSpec`] laid out in one of two schemas and
//! serialized in one of two formats. The HELICS schema is the spec itself;
//! the FNCS schema keeps only the name, the time step, the broker address and
//! one `values` entry per subscription. Endpoints keep the order the topology
//! built them in, since federate programs address them by position.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::topology::{ParticipantSpec, Subscription};

/// Broker every FNCS federate connects to.
pub const FNCS_BROKER_ADDRESS: &str = "tcp://localhost:5570";

/// Field layout of a participant document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentSchema {
    #[default]
    Helics,
    Fncs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    /// Case-insensitive lookup of a format name such as `"JSON"` or `"yaml"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "JSON" => Some(Self::Json),
            "YAML" | "YML" => Some(Self::Yaml),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to write participant document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize participant document as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to serialize participant document as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// File name of a participant's document, e.g. `sender0.json`.
pub fn document_file_name(participant: &str, format: DocumentFormat) -> String {
    format!("{participant}.{}", format.extension())
}

#[derive(Serialize)]
struct FncsDocument<'a> {
    name: &'a str,
    time_delta: String,
    broker: &'static str,
    values: FncsValues<'a>,
}

impl<'a> FncsDocument<'a> {
    fn new(spec: &'a ParticipantSpec) -> Self {
        Self {
            name: &spec.name,
            // Whole seconds only.
            time_delta: format!("{}s", spec.time_delta.trunc() as i64),
            broker: FNCS_BROKER_ADDRESS,
            values: FncsValues(&spec.subscriptions),
        }
    }
}

/// Subscriptions as a `value key -> value` map, in subscription order.
struct FncsValues<'a>(&'a [Subscription]);

impl Serialize for FncsValues<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|subscription| {
            (subscription.value_key.as_str(), FncsValue::new(subscription))
        }))
    }
}

#[derive(Serialize)]
struct FncsValue<'a> {
    topic: &'a str,
    default: &'static str,
    #[serde(rename = "type")]
    data_type: &'a str,
    list: bool,
}

impl<'a> FncsValue<'a> {
    fn new(subscription: &'a Subscription) -> Self {
        Self {
            topic: &subscription.key,
            default: "",
            data_type: &subscription.data_type,
            list: false,
        }
    }
}

fn serialize_as<T: Serialize>(
    document: &T,
    format: DocumentFormat,
) -> Result<Vec<u8>, DocumentError> {
    match format {
        DocumentFormat::Json => {
            let mut buffer = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
            let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
            document.serialize(&mut serializer)?;
            Ok(buffer)
        }
        DocumentFormat::Yaml => Ok(serde_yaml::to_string(document)?.into_bytes()),
    }
}

/// Serialize a participant document without touching the filesystem.
pub fn render_document(
    spec: &ParticipantSpec,
    schema: DocumentSchema,
    format: DocumentFormat,
) -> Result<Vec<u8>, DocumentError> {
    match schema {
        DocumentSchema::Helics => serialize_as(spec, format),
        DocumentSchema::Fncs => serialize_as(&FncsDocument::new(spec), format),
    }
}

/// Write `spec` to `destination`, creating or overwriting exactly that file.
pub fn write_document(
    spec: &ParticipantSpec,
    schema: DocumentSchema,
    format: DocumentFormat,
    destination: impl AsRef<Path>,
) -> Result<(), DocumentError> {
    let destination = destination.as_ref();
    let contents = render_document(spec, schema, format)?;
    fs::write(destination, contents).map_err(|source| DocumentError::Io {
        path: destination.to_path_buf(),
        source,
    })?;
    debug!("wrote {} document {}", spec.name, destination.display());
    Ok(())
}

/// Like [`write_document`], but with the format given by name.
///
/// An unknown format name is only a warning: nothing is written and
/// `Ok(false)` is returned.
pub fn write_document_named(
    spec: &ParticipantSpec,
    schema: DocumentSchema,
    format_name: &str,
    destination: impl AsRef<Path>,
) -> Result<bool, DocumentError> {
    match DocumentFormat::from_name(format_name) {
        Some(format) => {
            write_document(spec, schema, format, destination)?;
            Ok(true)
        }
        None => {
            warn!(
                "unknown configuration file format '{format_name}', skipping {}",
                spec.name
            );
            Ok(false)
        }
    }
}
