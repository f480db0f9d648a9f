use std::{
    fmt::Display,
    fs::{self, File},
    io::{BufWriter, Write},
    str::FromStr,
    sync::Mutex,
};

use chrono::Local;
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

use crate::config::LoggerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_colored(&self) -> ColoredString {
        match self {
            LogLevel::Debug => "DBG".bright_cyan(),
            LogLevel::Info => "INF".bright_green(),
            LogLevel::Warn => "WAR".yellow(),
            LogLevel::Error => "ERR".bright_red(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DBG",
            LogLevel::Info => "INF",
            LogLevel::Warn => "WAR",
            LogLevel::Error => "ERR",
        }
    }

    /// Whether a message of level `self` passes a logger configured with
    /// `threshold`.
    pub fn show(&self, threshold: &LogLevel) -> bool {
        match self {
            LogLevel::Debug => *threshold == LogLevel::Debug,
            LogLevel::Info => *threshold == LogLevel::Debug || *threshold == LogLevel::Info,
            LogLevel::Warn => *threshold != LogLevel::Error,
            LogLevel::Error => true,
        }
    }

    /// The matching `tracing` level, used to configure the subscriber for
    /// library-internal events.
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "info" | "inf" => Ok(LogLevel::Info),
            "warn" | "warning" | "war" => Ok(LogLevel::Warn),
            "error" | "err" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "Debug"),
            LogLevel::Info => write!(f, "Info"),
            LogLevel::Warn => write!(f, "Warn"),
            LogLevel::Error => write!(f, "Error"),
        }
    }
}

/// Writes prefixed log lines to stderr and optionally mirrors every line,
/// regardless of level and without colors, into a log file.
#[derive(Debug)]
pub struct Logger {
    level: LogLevel,
    name: String,
    file: Option<Mutex<BufWriter<File>>>,
}

impl Logger {
    pub fn new(level: LogLevel, name: impl Into<String>) -> Self {
        Logger {
            level,
            name: name.into(),
            file: None,
        }
    }

    pub fn with_log_file(mut self, path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        self.file = Some(Mutex::new(BufWriter::new(File::create(path)?)));
        Ok(self)
    }

    pub fn from_config(config: &LoggerConfig, name: &str) -> anyhow::Result<Option<Self>> {
        if !*config.get_enabled() {
            return Ok(None);
        }

        let logger = Logger::new(*config.get_log_level(), name);

        if *config.get_log_file() {
            let path = format!(
                "./logs/dfa_equiv_{}.txt",
                Local::now().format("%Y-%m-%d_%H-%M-%S")
            );
            return Ok(Some(logger.with_log_file(path)?));
        }

        Ok(Some(logger))
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        self.writeln_to_file(&format!("[{}] {}: {}", level.tag(), self.name, message));

        if level.show(&self.level) {
            eprintln!(
                "[{}] {} {}",
                level.to_colored(),
                format!("{}:", self.name).dimmed(),
                message
            );
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn writeln_to_file(&self, line: &str) {
        let Some(file) = &self.file else {
            return;
        };

        // a poisoned lock or a failed write only loses log output
        if let Ok(mut f) = file.lock() {
            let _ = writeln!(f, "{}", line);
        }
    }

    pub fn flush(&self) {
        if let Some(file) = &self.file
            && let Ok(mut f) = file.lock()
        {
            let _ = f.flush();
        }
    }

    pub fn object<'a>(&'a self, name: &'a str) -> ObjectBuilder<'a> {
        ObjectBuilder::new(name, self)
    }
}

/// Collects `name: value` fields and logs them as one indented block.
#[derive(Debug, Clone)]
pub struct ObjectBuilder<'a> {
    logger: &'a Logger,
    name: &'a str,
    fields: Vec<(&'a str, String)>,
}

impl<'a> ObjectBuilder<'a> {
    fn new(name: &'a str, logger: &'a Logger) -> Self {
        ObjectBuilder {
            logger,
            name,
            fields: vec![],
        }
    }

    pub fn add_field(mut self, name: &'a str, value: impl ToString) -> Self {
        self.fields.push((name, value.to_string()));

        self
    }

    fn build(&self) -> String {
        let mut result = format!("{} {{", self.name);
        for (name, value) in &self.fields {
            result.push_str(&format!("\n  {}: {}", name, value));
        }
        result.push_str("\n}");
        result
    }

    pub fn log(&self, level: LogLevel) {
        self.logger.log(level, &self.build());
    }
}

#[test]
fn test_level_threshold() {
    assert!(LogLevel::Error.show(&LogLevel::Warn));
    assert!(LogLevel::Warn.show(&LogLevel::Warn));
    assert!(!LogLevel::Info.show(&LogLevel::Warn));
    assert!(LogLevel::Debug.show(&LogLevel::Debug));
    assert!(!LogLevel::Debug.show(&LogLevel::Info));
}

#[test]
fn test_level_from_str() {
    assert_eq!("dbg".parse::<LogLevel>(), Ok(LogLevel::Debug));
    assert_eq!("Warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
    assert!("verbose".parse::<LogLevel>().is_err());
}

#[test]
fn test_object_builder_format() {
    let logger = Logger::new(LogLevel::Error, "test");
    let block = logger
        .object("Case")
        .add_field("states", 3)
        .add_field("symbols", "a b")
        .build();

    assert_eq!(block, "Case {\n  states: 3\n  symbols: a b\n}");
}
