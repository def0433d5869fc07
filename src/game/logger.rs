//! Match logger using a bump arena for temporary formatting
//!
//! Captured entries own their strings, so the buffer can be read back through
//! a borrowing [`LogGuard`] while the logger keeps running.

use crate::game::match_state::Side;
use crate::game::sink::{Notice, PresentationSink, ScoreboardField};
use crate::game::VerbosityLevel;
use bumpalo::collections::String as BumpString;
use bumpalo::Bump;
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::fmt::Write as FmtWrite;
use std::ops::Deref;

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to in-memory buffer (no stdout)
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    /// Optional category ("notice", "scoreboard", "strategy_choice")
    pub category: Option<String>,
}

/// Read-only access to captured entries
pub struct LogGuard<'a> {
    guard: Ref<'a, Vec<LogEntry>>,
}

impl<'a> LogGuard<'a> {
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.guard.iter()
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }
}

impl<'a> Deref for LogGuard<'a> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Structured match logger, the interactive counterpart of [`NullSink`]
///
/// [`NullSink`]: crate::game::NullSink
pub struct MatchLogger {
    verbosity: VerbosityLevel,
    output_format: OutputFormat,
    output_mode: OutputMode,
    /// Print scoreboard updates as they happen
    show_scoreboard: bool,
    /// Echo which strategy took each decision to stderr
    debug_strategies: bool,

    /// Arena for notice and scoreboard formatting, reset with the buffer
    format_bump: RefCell<Bump>,

    log_buffer: RefCell<Vec<LogEntry>>,
}

impl MatchLogger {
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        MatchLogger {
            verbosity,
            output_format: OutputFormat::default(),
            output_mode: OutputMode::default(),
            show_scoreboard: false,
            debug_strategies: false,
            format_bump: RefCell::new(Bump::new()),
            log_buffer: RefCell::new(Vec::new()),
        }
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Capture to memory only (suppresses stdout)
    pub fn enable_capture(&mut self) {
        self.output_mode = OutputMode::Memory;
    }

    pub fn disable_capture(&mut self) {
        self.output_mode = OutputMode::Stdout;
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn set_show_scoreboard(&mut self, enabled: bool) {
        self.show_scoreboard = enabled;
    }

    pub fn set_debug_strategies(&mut self, enabled: bool) {
        self.debug_strategies = enabled;
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    /// Print buffered logs that the verbosity allows, then clear the buffer
    pub fn flush_buffer(&mut self) {
        let buffer = self.log_buffer.borrow();
        for entry in buffer.iter() {
            if entry.level <= self.verbosity {
                self.log_to_stdout(entry);
            }
        }
        drop(buffer);
        self.clear_logs();
    }

    /// Print only the last `tail_lines` buffered logs, then clear the buffer
    pub fn flush_tail(&mut self, tail_lines: usize) {
        let buffer = self.log_buffer.borrow();

        let total_lines = buffer.len();
        let elided_count = total_lines.saturating_sub(tail_lines);
        if elided_count > 0 {
            println!(
                ">>> {} LOG LINES ELIDED. PRINTING LAST {} LINES <<<",
                elided_count, tail_lines
            );
        }

        for entry in buffer.iter().skip(elided_count) {
            if entry.level <= self.verbosity {
                self.log_to_stdout(entry);
            }
        }

        drop(buffer);
        self.clear_logs();
    }

    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.log_buffer.borrow(),
        }
    }

    pub fn clear_logs(&mut self) {
        self.log_buffer.borrow_mut().clear();
        self.format_bump.borrow_mut().reset();
    }

    fn log_to_stdout(&self, entry: &LogEntry) {
        match self.output_format {
            OutputFormat::Json => match serde_json::to_string(entry) {
                Ok(line) => println!("{line}"),
                Err(_) => println!("{}", entry.message),
            },
            OutputFormat::Text if entry.level == VerbosityLevel::Minimal => {
                println!("{}", entry.message)
            }
            OutputFormat::Text => println!("  {}", entry.message),
        }
    }

    fn log(&self, level: VerbosityLevel, message: &str, category: Option<&str>) {
        let should_capture = self.is_capturing();
        let should_output = matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both);

        if level > self.verbosity && !should_capture {
            return;
        }

        let entry = LogEntry {
            level,
            message: message.to_string(),
            category: category.map(str::to_string),
        };
        if should_output && level <= self.verbosity {
            self.log_to_stdout(&entry);
        }
        if should_capture {
            self.log_buffer.borrow_mut().push(entry);
        }
    }

    #[inline]
    pub fn minimal(&self, message: &str) {
        self.log(VerbosityLevel::Minimal, message, None);
    }

    #[inline]
    pub fn normal(&self, message: &str) {
        self.log(VerbosityLevel::Normal, message, None);
    }

    #[inline]
    pub fn verbose(&self, message: &str) {
        self.log(VerbosityLevel::Verbose, message, None);
    }

    /// Log a decision taken by a strategy
    ///
    /// The strategy name is kept out of the message so that logs read the same
    /// whichever strategy decided.
    pub fn strategy_choice(&self, strategy_name: &str, message: &str) {
        if self.debug_strategies {
            eprintln!("  >>> {}: {}", strategy_name, message);
        }
        self.log(VerbosityLevel::Normal, message, Some("strategy_choice"));
    }
}

impl PresentationSink for MatchLogger {
    fn log_record(&mut self, text: &str) {
        self.normal(text);
    }

    fn notify(&mut self, notice: Notice, args: &[&str]) {
        let bump = self.format_bump.borrow();
        let mut line = BumpString::new_in(&bump);
        let _ = write!(line, "{notice:?}");
        for (i, arg) in args.iter().enumerate() {
            line.push_str(if i == 0 { ": " } else { ", " });
            line.push_str(arg);
        }
        self.log(VerbosityLevel::Minimal, &line, Some("notice"));
    }

    fn update_scoreboard(&mut self, side: Side, field: ScoreboardField, value: &str) {
        if !self.show_scoreboard && !self.is_capturing() {
            return;
        }
        let bump = self.format_bump.borrow();
        let mut line = BumpString::new_in(&bump);
        let _ = write!(line, "[{side:?}] {field:?} = {value}");
        self.log(VerbosityLevel::Verbose, &line, Some("scoreboard"));
    }

    fn strategy_choice(&mut self, strategy: &str, text: &str) {
        MatchLogger::strategy_choice(self, strategy, text);
    }
}

impl Default for MatchLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MatchLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.log_buffer.borrow().len())
            .finish()
    }
}

/// Clones settings only; the copy starts with an empty buffer
impl Clone for MatchLogger {
    fn clone(&self) -> Self {
        MatchLogger {
            verbosity: self.verbosity,
            output_format: self.output_format,
            output_mode: self.output_mode,
            show_scoreboard: self.show_scoreboard,
            debug_strategies: self.debug_strategies,
            format_bump: RefCell::new(Bump::new()),
            log_buffer: RefCell::new(Vec::new()),
        }
    }
}

impl Serialize for MatchLogger {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("MatchLogger", 4)?;
        state.serialize_field("verbosity", &self.verbosity)?;
        state.serialize_field("output_format", &self.output_format)?;
        state.serialize_field("output_mode", &self.output_mode)?;
        state.serialize_field("show_scoreboard", &self.show_scoreboard)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for MatchLogger {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct MatchLoggerData {
            verbosity: VerbosityLevel,
            output_format: OutputFormat,
            output_mode: OutputMode,
            #[serde(default)]
            show_scoreboard: bool,
        }

        let data = MatchLoggerData::deserialize(deserializer)?;
        let mut logger = MatchLogger::with_verbosity(data.verbosity);
        logger.output_format = data.output_format;
        logger.output_mode = data.output_mode;
        logger.show_scoreboard = data.show_scoreboard;
        Ok(logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_creation() {
        let logger = MatchLogger::new();
        assert_eq!(logger.verbosity(), VerbosityLevel::Normal);
    }

    #[test]
    fn test_log_capture() {
        let mut logger = MatchLogger::new();
        logger.enable_capture();

        logger.normal("kick-off");
        logger.minimal("try");

        let logs = logger.logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "kick-off");
        assert_eq!(logs[1].level, VerbosityLevel::Minimal);
    }

    #[test]
    fn test_capture_keeps_levels_above_verbosity() {
        let mut logger = MatchLogger::with_verbosity(VerbosityLevel::Minimal);
        logger.enable_capture();
        logger.verbose("ruck");
        assert_eq!(logger.logs().len(), 1);
    }

    #[test]
    fn test_notice_formatting() {
        let mut logger = MatchLogger::new();
        logger.enable_capture();
        logger.notify(Notice::SinBin, &["A. Player", "12"]);
        logger.update_scoreboard(Side::Hosts, ScoreboardField::Points, "7");

        let logs = logger.logs();
        assert_eq!(logs[0].message, "SinBin: A. Player, 12");
        assert_eq!(logs[0].category.as_deref(), Some("notice"));
        assert_eq!(logs[1].message, "[Hosts] Points = 7");
    }

    #[test]
    fn test_flush_buffer() {
        let mut logger = MatchLogger::new();
        logger.enable_capture();

        logger.normal("message 1");
        logger.normal("message 2");
        assert_eq!(logger.logs().len(), 2);

        logger.flush_tail(1);
        assert!(logger.logs().is_empty());
    }

    #[test]
    fn test_disable_capture() {
        let mut logger = MatchLogger::new();
        logger.enable_capture();
        assert!(logger.is_capturing());

        logger.disable_capture();
        assert!(!logger.is_capturing());
    }

    #[test]
    fn test_clone_and_serde_drop_buffer() {
        let mut logger = MatchLogger::with_verbosity(VerbosityLevel::Verbose);
        logger.enable_capture();
        logger.normal("line");

        let json = serde_json::to_string(&logger).unwrap();
        let restored: MatchLogger = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.verbosity(), VerbosityLevel::Verbose);
        assert!(restored.is_capturing());
        assert!(restored.logs().is_empty());
        assert!(logger.clone().logs().is_empty());
    }
}
