//! Invocation configuration
//!
//! Built once from an argument list, validated, then never mutated.

use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::time::Duration;
use tcsignal_shared::{defaults, Status};
use thiserror::Error;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Structured JSON lines
    Json,
    /// Human-readable console output
    #[default]
    Console,
}

/// Minimum log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Raw command-line surface
#[derive(Parser, Debug)]
#[command(name = "tcsignal-aws")]
#[command(about = "Run a readiness command and signal SUCCESS/FAILURE to an SQS queue")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// (required) SQS queue URL
    #[arg(short = 'u', long, env = "TCSIGNAL_QUEUE_URL", default_value = "")]
    pub queue_url: String,

    /// (required) Unique signal ID for the deployment
    #[arg(short = 'i', long, env = "TCSIGNAL_ID", default_value = "")]
    pub id: String,

    /// Run this command and signal based on its exit code
    #[arg(short = 'e', long)]
    pub exec: Option<String>,

    /// Shortcut: send SUCCESS or FAILURE without exec
    #[arg(short = 's', long)]
    pub status: Option<String>,

    /// Override instance ID (default: fetch from instance metadata)
    #[arg(short = 'n', long, env = "TCSIGNAL_INSTANCE_ID")]
    pub instance_id: Option<String>,

    /// Override region (default: fetch from instance metadata)
    #[arg(short = 'r', long, env = "TCSIGNAL_REGION")]
    pub region: Option<String>,

    /// Transient-error retries
    #[arg(long, default_value_t = defaults::RETRIES)]
    pub retries: u32,

    /// Timeout per publish call
    #[arg(long, value_parser = humantime::parse_duration, default_value = "10s")]
    pub publish_timeout: Duration,

    /// Total operation timeout
    #[arg(long, value_parser = humantime::parse_duration, default_value = "30s")]
    pub timeout: Duration,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Console)]
    pub log_format: LogFormat,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

/// Configuration errors, detected before any work begins
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Help or version was requested, or the arguments did not parse
    #[error(transparent)]
    Parse(#[from] clap::Error),

    #[error("--queue-url is required")]
    MissingQueueUrl,

    #[error("--id is required")]
    MissingId,

    #[error("either --exec or --status must be provided")]
    MissingExecOrStatus,

    #[error("--exec and --status are mutually exclusive")]
    ExecAndStatus,

    #[error("--status must be either SUCCESS or FAILURE")]
    InvalidStatus,

    #[error("--timeout must be greater than zero")]
    ZeroTimeout,

    #[error("--publish-timeout must be greater than zero")]
    ZeroPublishTimeout,

    #[error("--publish-timeout ({publish:?}) must not exceed --timeout ({overall:?})")]
    PublishTimeoutExceedsOverall { publish: Duration, overall: Duration },
}

impl ConfigError {
    /// True for `--help`/`--version`, which are not failures
    pub fn is_informational(&self) -> bool {
        match self {
            ConfigError::Parse(e) => matches!(
                e.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ),
            _ => false,
        }
    }
}

/// How the outcome status is decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSource {
    /// Run this shell command line and use its exit code
    Exec(String),
    /// Use this status as given
    Explicit(Status),
}

/// Validated invocation configuration
#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// Destination queue URL
    pub queue_url: String,
    /// Caller-supplied deployment/signal token
    pub signal_id: String,
    /// Where the status comes from
    pub source: StatusSource,
    /// Skip the instance ID lookup when set
    pub instance_id_override: Option<String>,
    /// Skip the region lookup when set
    pub region_override: Option<String>,
    /// Retry budget handed to the publisher unchanged
    pub retries: u32,
    /// Budget for one publish call
    pub publish_timeout: Duration,
    /// Budget for the whole run
    pub overall_timeout: Duration,
    /// Log output format
    pub log_format: LogFormat,
    /// Minimum log level
    pub log_level: LogLevel,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            queue_url: String::new(),
            signal_id: String::new(),
            source: StatusSource::Explicit(Status::Success),
            instance_id_override: None,
            region_override: None,
            retries: defaults::RETRIES,
            publish_timeout: defaults::PUBLISH_TIMEOUT,
            overall_timeout: defaults::OVERALL_TIMEOUT,
            log_format: LogFormat::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl SignalConfig {
    /// Parse and validate an argument list (first item is the program name)
    pub fn try_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)?;
        Self::try_from(cli)
    }
}

impl TryFrom<Cli> for SignalConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if cli.queue_url.is_empty() {
            return Err(ConfigError::MissingQueueUrl);
        }
        if cli.id.is_empty() {
            return Err(ConfigError::MissingId);
        }

        let exec = non_empty(cli.exec);
        let status = non_empty(cli.status);
        let source = match (exec, status) {
            (None, None) => return Err(ConfigError::MissingExecOrStatus),
            (Some(_), Some(_)) => return Err(ConfigError::ExecAndStatus),
            (Some(command), None) => StatusSource::Exec(command),
            (None, Some(status)) => StatusSource::Explicit(
                status.parse().map_err(|_| ConfigError::InvalidStatus)?,
            ),
        };

        if cli.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if cli.publish_timeout.is_zero() {
            return Err(ConfigError::ZeroPublishTimeout);
        }
        if cli.publish_timeout > cli.timeout {
            return Err(ConfigError::PublishTimeoutExceedsOverall {
                publish: cli.publish_timeout,
                overall: cli.timeout,
            });
        }

        Ok(Self {
            queue_url: cli.queue_url,
            signal_id: cli.id,
            source,
            instance_id_override: non_empty(cli.instance_id),
            region_override: non_empty(cli.region),
            retries: cli.retries,
            publish_timeout: cli.publish_timeout,
            overall_timeout: cli.timeout,
            log_format: cli.log_format,
            log_level: cli.log_level,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
