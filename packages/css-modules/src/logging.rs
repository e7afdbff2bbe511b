// Logging
//
// The engine reports through a `Logger` handle passed in by the host: module
// processing, cache hits and resolution at debug level, malformed `@value`
// rules at warn level, and one summary line per invocation at info level.

/// Severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

pub trait Logger {
    /// Least severe level that is still emitted.
    fn level(&self) -> LogLevel;
    fn log(&self, level: LogLevel, msg: &str);

    fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.level()
    }
    fn debug(&self, msg: &str) {
        self.log(LogLevel::Debug, msg)
    }
    fn info(&self, msg: &str) {
        self.log(LogLevel::Info, msg)
    }
    fn warn(&self, msg: &str) {
        self.log(LogLevel::Warn, msg)
    }
    fn error(&self, msg: &str) {
        self.log(LogLevel::Error, msg)
    }
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn level(&self) -> LogLevel {
        LogLevel::Error
    }

    fn log(&self, _level: LogLevel, _msg: &str) {}
}

/// Writes `[LEVEL] message` lines to stderr.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleLogger {
    level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }
}

impl Logger for ConsoleLogger {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn log(&self, level: LogLevel, msg: &str) {
        if self.is_enabled(level) {
            eprintln!("[{}] {}", level.label(), msg);
        }
    }
}

/// Forwards to the `log` crate, so any `log` backend can receive the records.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacadeLogger;

impl Logger for FacadeLogger {
    fn level(&self) -> LogLevel {
        match log::max_level() {
            log::LevelFilter::Off | log::LevelFilter::Error => LogLevel::Error,
            log::LevelFilter::Warn => LogLevel::Warn,
            log::LevelFilter::Info => LogLevel::Info,
            log::LevelFilter::Debug | log::LevelFilter::Trace => LogLevel::Debug,
        }
    }

    fn log(&self, level: LogLevel, msg: &str) {
        let level: log::Level = level.into();
        log::log!(target: "css_modules", level, "{}", msg);
    }
}
