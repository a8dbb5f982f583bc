//! Command-line interface for greatness-client.
//!
//! Parsed with lexopt; every flag has a config file and environment
//! variable counterpart (see [`crate::config`]).

use std::ffi::OsString;
use std::path::PathBuf;

use thiserror::Error;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Engine API root (overrides config file).
    pub server: Option<String>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// How long transition errors stay visible, in milliseconds.
    pub dismiss_ms: Option<u64>,
    /// Disable analytics events.
    pub no_analytics: bool,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('s') | Long("server") => {
                let value: String = parser.value()?.parse()?;
                if !value.starts_with("http://") && !value.starts_with("https://") {
                    return Err(ArgsError::InvalidValue("server", value));
                }
                result.server = Some(value);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                let secs = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidValue("timeout", value))?;
                result.timeout_secs = Some(secs);
            }
            Long("dismiss-ms") => {
                let value: String = parser.value()?.parse()?;
                let ms = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidValue("dismiss-ms", value))?;
                result.dismiss_ms = Some(ms);
            }
            Long("no-analytics") => {
                result.no_analytics = true;
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"greatness-client {version}
Terminal client for The Greatness Path narrative engine

USAGE:
    greatness-client [OPTIONS]

OPTIONS:
    -s, --server <URL>      Engine API root [default: http://127.0.0.1:8000/api]
    -c, --config <FILE>     Path to configuration file (JSON)
    -t, --timeout <SECS>    Request timeout in seconds [default: 120]
        --dismiss-ms <MS>   How long transition errors stay visible [default: 5000]
        --no-analytics      Do not emit state view events
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    GREATNESS_SERVER_URL        Engine API root (overrides config)
    GREATNESS_REQUEST_TIMEOUT   Request timeout in seconds (overrides config)
    GREATNESS_ERROR_DISMISS_MS  Error display time (overrides config)
    GREATNESS_ANALYTICS         "0" or "false" disables analytics
    GREATNESS_LOG_LEVEL         Log level (overrides config)
    RUST_LOG                    Alternative log level setting

SESSION COMMANDS:
    <action> [json]         Submit a transition, e.g. `begin` or `reveal {{"admired_person":"Seneca"}}`
    :set <key> <value>      Set an input field (value parsed as JSON, else text)
    :input                  Show the input buffer
    :submit <action>        Submit the input buffer
    :archetype <name>       Choose an archetype
    :new                    Start a new session
    :cost                   Show the cost report
    :timeline               Show completed chapters
    :dismiss                Dismiss the current error
    :help                   Show session commands
    :quit                   Leave
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("greatness-client {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// Lexopt parsing error.
    #[error("{0}")]
    Lexopt(#[from] lexopt::Error),
    /// Invalid argument value.
    #[error("invalid value for --{0}: '{1}'")]
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    #[error("unexpected argument: '{0}'")]
    UnexpectedArgument(String),
}
