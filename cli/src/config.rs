//! Configuration management for the CLI.

use stampsync_engine::{AuditConfig, CadenceConfig, ResequenceConfig, StreamName};
use std::{env, fmt, path::PathBuf, str::FromStr};

const DEFAULT_OFFSET_STREAMS: &str = "/imu/data";
const DEFAULT_CADENCE_STREAMS: &str = "/imu/data,/sync_board/imu";

/// Which tool to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Audit,
    Resequence,
    Cadence,
}

impl FromStr for Command {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "audit" => Ok(Command::Audit),
            "resequence" => Ok(Command::Resequence),
            "cadence" => Ok(Command::Cadence),
            other => Err(ConfigError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Audit => "audit",
            Command::Resequence => "resequence",
            Command::Cadence => "cadence",
        };
        f.write_str(name)
    }
}

/// Command-specific settings.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Audit(AuditConfig),
    Resequence {
        output: PathBuf,
        config: ResequenceConfig,
    },
    Cadence {
        streams: Vec<StreamName>,
        config: CadenceConfig,
    },
}

impl Task {
    /// The command this task runs.
    pub fn command(&self) -> Command {
        match self {
            Task::Audit(_) => Command::Audit,
            Task::Resequence { .. } => Command::Resequence,
            Task::Cadence { .. } => Command::Cadence,
        }
    }
}

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON-lines session to read
    pub input: PathBuf,
    pub task: Task,
    /// Where to also write the final report as JSON
    pub report_json: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `command` is the first positional argument; when absent the command
    /// is read from `STAMPSYNC_COMMAND`.
    pub fn from_env(command: Option<String>) -> Result<Self, ConfigError> {
        Self::from_lookup(command, |key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(command: Option<String>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let command: Command = command
            .or_else(|| vars.get("STAMPSYNC_COMMAND"))
            .ok_or(ConfigError::MissingCommand)?
            .parse()?;

        let input: PathBuf = vars.require("STAMPSYNC_INPUT")?.into();
        let report_json = vars.get("STAMPSYNC_REPORT_JSON").map(PathBuf::from);

        let task = match command {
            Command::Audit => Task::Audit(AuditConfig::new(
                vars.require("STAMPSYNC_REFERENCE")?,
                vars.require_list("STAMPSYNC_TARGETS")?,
                vars.number("STAMPSYNC_TOLERANCE_NS", 0)?,
            )),
            Command::Resequence => {
                let output: PathBuf = vars.require("STAMPSYNC_OUTPUT")?.into();
                if output == input {
                    return Err(ConfigError::OutputIsInput(output));
                }
                let mut config = ResequenceConfig::new(vars.require_list("STAMPSYNC_SYNC_STREAMS")?);
                config.offset_streams =
                    vars.list_or("STAMPSYNC_OFFSET_STREAMS", DEFAULT_OFFSET_STREAMS);
                Task::Resequence { output, config }
            }
            Command::Cadence => Task::Cadence {
                streams: vars.list_or("STAMPSYNC_CADENCE_STREAMS", DEFAULT_CADENCE_STREAMS),
                config: CadenceConfig {
                    expected_period_ns: vars.number(
                        "STAMPSYNC_EXPECTED_PERIOD_NS",
                        CadenceConfig::default().expected_period_ns,
                    )?,
                    tolerance_ns: vars.number(
                        "STAMPSYNC_PERIOD_TOLERANCE_NS",
                        CadenceConfig::default().tolerance_ns,
                    )?,
                },
            },
        };

        Ok(Self {
            input,
            task,
            report_json,
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn require(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingVar(key))
    }

    fn require_list(&self, key: &'static str) -> Result<Vec<StreamName>, ConfigError> {
        let list = split_list(&self.require(key)?);
        if list.is_empty() {
            return Err(ConfigError::MissingVar(key));
        }
        Ok(list)
    }

    /// Unset falls back to `default`; set but empty means no streams.
    fn list_or(&self, key: &str, default: &str) -> Vec<StreamName> {
        split_list(&self.get(key).unwrap_or_else(|| default.to_string()))
    }

    fn number(&self, key: &'static str, default: u64) -> Result<u64, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { key, value }),
        }
    }
}

fn split_list(value: &str) -> Vec<StreamName> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no command given (expected audit, resequence or cadence)")]
    MissingCommand,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{0} environment variable is required")]
    MissingVar(&'static str),

    #[error("invalid {key} value: {value}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("output {} is the input session", .0.display())]
    OutputIsInput(PathBuf),
}
