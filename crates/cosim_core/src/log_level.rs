use log::warn;
use serde::{Deserialize, Serialize};

/// Log level understood by both the broker and the federate programs.
///
/// The broker takes the numeric form on its command line, the federates read
/// the name from the `LOG_LEVEL` environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    #[default]
    Info = 2,
    Debug = 3,
    Debug1 = 4,
    Debug2 = 5,
    Debug3 = 6,
    Debug4 = 7,
}

impl LogLevel {
    pub const ALL: [LogLevel; 8] = [
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Debug1,
        LogLevel::Debug2,
        LogLevel::Debug3,
        LogLevel::Debug4,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Debug1 => "DEBUG1",
            Self::Debug2 => "DEBUG2",
            Self::Debug3 => "DEBUG3",
            Self::Debug4 => "DEBUG4",
        }
    }

    pub fn as_int(self) -> u8 {
        self as u8
    }

    /// Resolve a level by name, falling back to `INFO` for unknown names.
    pub fn from_name(name: &str) -> Self {
        let trimmed = name.trim();
        match Self::ALL
            .iter()
            .find(|level| level.name().eq_ignore_ascii_case(trimmed))
        {
            Some(level) => *level,
            None => {
                warn!("unknown log level '{name}' specified, using INFO");
                Self::Info
            }
        }
    }
}

impl From<String> for LogLevel {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.name().to_string()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_map_to_runtime_integers() {
        assert_eq!(LogLevel::from_name("ERROR").as_int(), 0);
        assert_eq!(LogLevel::from_name("INFO").as_int(), 2);
        assert_eq!(LogLevel::from_name("debug4").as_int(), 7);
    }

    #[test]
    fn unknown_name_falls_back_to_info() {
        assert_eq!(LogLevel::from_name("VERBOSE"), LogLevel::Info);
        assert_eq!(LogLevel::from_name(""), LogLevel::Info);
    }

    #[test]
    fn deserializes_from_plain_name() {
        let level: LogLevel = serde_json::from_str("\"DEBUG2\"").unwrap();
        assert_eq!(level, LogLevel::Debug2);

        let unknown: LogLevel = serde_json::from_str("\"LOUD\"").unwrap();
        assert_eq!(unknown, LogLevel::Info);
        assert_eq!(
            serde_json::to_string(&LogLevel::Warning).unwrap(),
            "\"WARNING\""
        );
    }
}
