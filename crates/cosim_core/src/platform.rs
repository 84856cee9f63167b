use serde::{Deserialize, Serialize};

use crate::document::{DocumentFormat, DocumentSchema};

/// Co-simulation runtime the experiment is launched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    #[default]
    Helics,
    Fncs,
}

impl Platform {
    pub fn label(self) -> &'static str {
        match self {
            Self::Helics => "HELICS",
            Self::Fncs => "FNCS",
        }
    }

    pub fn default_broker_program(self) -> &'static str {
        match self {
            Self::Helics => "helics_broker",
            Self::Fncs => "fncs_broker",
        }
    }

    pub fn default_federate_program(self) -> &'static str {
        match self {
            Self::Helics => "testFedHELICS",
            Self::Fncs => "testFedFNCS",
        }
    }

    /// Document format the platform's federates read natively.
    pub fn document_format(self) -> DocumentFormat {
        match self {
            Self::Helics => DocumentFormat::Json,
            Self::Fncs => DocumentFormat::Yaml,
        }
    }

    /// Document layout the platform's federates read.
    pub fn document_schema(self) -> DocumentSchema {
        match self {
            Self::Helics => DocumentSchema::Helics,
            Self::Fncs => DocumentSchema::Fncs,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
