use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};

static STUDIO_LOGGER: Lazy<StudioLogger> = Lazy::new(StudioLogger::new);

pub fn init() -> Result<(), String> {
    init_with_config(LoggerConfig::default())
}

pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    STUDIO_LOGGER.update_config(config.clone());

    if let Err(e) = log::set_logger(&*STUDIO_LOGGER) {
        return Err(format!("Failed to set logger: {:?}", e));
    }

    log::set_max_level(config.min_level.to_log_level_filter());
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

/// Label, emoji and color for each level, indexed by discriminant.
const LEVEL_STYLES: [(&str, &str, Color); 5] = [
    ("TRACE", "🔍", Color::Cyan),
    ("DEBUG", "🐛", Color::Blue),
    ("INFO", "💡", Color::Green),
    ("WARN", "⚠️", Color::Yellow),
    ("ERROR", "❌", Color::Red),
];

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        LEVEL_STYLES[*self as usize].0
    }

    pub fn emoji(&self) -> &'static str {
        LEVEL_STYLES[*self as usize].1
    }

    pub fn color(&self) -> Color {
        LEVEL_STYLES[*self as usize].2
    }

    pub fn to_log_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::Trace,
            LogLevel::Debug => Level::Debug,
            LogLevel::Info => Level::Info,
            LogLevel::Warn => Level::Warn,
            LogLevel::Error => Level::Error,
        }
    }

    pub fn to_log_level_filter(&self) -> log::LevelFilter {
        self.to_log_level().to_level_filter()
    }

    pub fn from_log_level(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }

    /// Accepts the usual `RUST_LOG`-style names, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub module: String,
    pub file: String,
    pub line: u32,
}

impl LogEntry {
    fn from_record(record: &Record) -> Self {
        Self {
            timestamp: Utc::now(),
            level: LogLevel::from_log_level(record.level()),
            message: record.args().to_string(),
            module: record.module_path().unwrap_or("unknown").to_string(),
            file: record.file().unwrap_or("unknown").to_string(),
            line: record.line().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_file_location: bool,
    pub show_module: bool,
    pub include_timestamp: bool,
    pub timestamp_format: String,
    pub output_json: bool,
    pub custom_prefix: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: true,
            show_emojis: true,
            show_file_location: false,
            show_module: true,
            include_timestamp: true,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            custom_prefix: None,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.custom_prefix = Some(prefix.into());
        self
    }

    pub fn production() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: false,
            show_emojis: false,
            output_json: true,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LogLevel::Debug,
            show_colors: true,
            show_emojis: true,
            output_json: false,
            show_file_location: true,
            ..Default::default()
        }
    }
}

/// Colored console logger. Writes to stderr so stdout stays free for command output.
pub struct StudioLogger {
    config: Mutex<LoggerConfig>,
}

impl StudioLogger {
    pub fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
        }
    }

    pub fn update_config(&self, new_config: LoggerConfig) {
        if let Ok(mut config) = self.config.lock() {
            *config = new_config;
        }
    }

    fn format_console_output(&self, entry: &LogEntry, config: &LoggerConfig) -> String {
        let paint = |text: String, style: fn(&str) -> ColoredString| {
            if config.show_colors {
                style(&text).to_string()
            } else {
                text
            }
        };
        let mut parts: Vec<String> = Vec::with_capacity(4);

        if let Some(prefix) = &config.custom_prefix {
            parts.push(format!(
                "[{}]",
                paint(prefix.clone(), |s| s.bright_white().bold())
            ));
        }
        if config.include_timestamp {
            let stamp = entry.timestamp.format(&config.timestamp_format).to_string();
            parts.push(paint(stamp, |s| s.bright_black()));
        }

        let label = match config.show_emojis {
            true => format!("{} {}", entry.level.emoji(), entry.level.as_str()),
            false => entry.level.as_str().to_string(),
        };
        let label = if config.show_colors {
            label.color(entry.level.color()).bold().to_string()
        } else {
            label
        };
        parts.push(format!("[{}]", label));

        let mut body = String::new();
        if config.show_module && !entry.module.is_empty() {
            body.push_str(&paint(entry.module.clone(), |s| s.bright_blue()));
            body.push_str("::");
        }
        body.push_str(&paint(entry.message.clone(), |s| s.white().bold()));
        if config.show_file_location {
            let location = format!("{}:{}", entry.file, entry.line);
            body.push_str(&format!(" ({})", paint(location, |s| s.bright_black())));
        }
        parts.push(body);

        parts.join(" ")
    }
}

impl Default for StudioLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl log::Log for StudioLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.config.lock() {
            Ok(config) => metadata.level() <= config.min_level.to_log_level(),
            Err(_) => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry::from_record(record);

        if let Ok(config) = self.config.lock() {
            let line = if config.output_json {
                serde_json::to_string(&entry).unwrap_or_default()
            } else {
                self.format_console_output(&entry, &config)
            };
            let _ = writeln!(io::stderr(), "{}", line);
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Measures one operation; logs the elapsed time when finished or dropped.
pub struct Timer {
    start: Instant,
    name: String,
    reported: bool,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("⏱️  Starting timer: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
            reported: false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Logs and returns the elapsed time.
    pub fn finish(mut self) -> Duration {
        self.report()
    }

    /// Drops the timer without logging.
    pub fn cancel(mut self) {
        self.reported = true;
    }

    fn report(&mut self) -> Duration {
        let duration = self.elapsed();
        if !self.reported {
            log::debug!(
                "⏱️  Timer '{}' completed in {}ms",
                self.name,
                duration.as_millis()
            );
            self.reported = true;
        }
        duration
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.report();
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

pub fn log_startup_info(app_name: &str, version: &str) {
    log::info!("🚀 Starting {} v{}", app_name, version);
    log::info!("📝 Logger initialized successfully");
}

/// Logs the effective client configuration; the token is masked.
pub fn log_config_info(config: &crate::config::HuggingFaceConfig) {
    log::info!("⚙️  Configuration loaded:");
    log::info!("   Endpoint: {}", config.endpoint());
    log::info!(
        "   API token: {}",
        match &config.api_token {
            Some(token) => mask_token(token),
            None => "❌ missing".to_string(),
        }
    );
    log::info!(
        "   Retries: {} attempts, {:.2}s apart",
        config.retry.max_retries,
        config.retry.retry_delay.as_secs_f64()
    );
    if let Some(timeout) = config.timeout {
        log::info!("   Timeout: {}s", timeout.as_secs());
    }
}

fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(5).collect();
    format!("{}... ({} chars)", visible, token.chars().count())
}
