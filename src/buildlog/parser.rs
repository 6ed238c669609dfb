//! Build log segmentation.
//!
//! The parser is a line-driven state machine. Target boundary markers switch
//! the current target; compiler command lines (possibly continued across
//! physical lines with a trailing `\`) become [`CompilerInvocation`]s of that
//! target. Everything else is ignored. Lines that look like compiler commands
//! but can't be understood are dropped with a recorded warning.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::invocation::CompilerInvocation;
use crate::util::args;

static BUILD_TARGET_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^=== BUILD (?:AGGREGATE )?TARGET (.+?) OF PROJECT .+ ===")
        .expect("valid build target header pattern")
});

static LEGACY_TARGET_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Build target (.+?)(?: of project\b.*)?$").expect("valid legacy target pattern")
});

static IN_TARGET_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(in target '([^']+)' from project '[^']*'\)").expect("valid in-target pattern")
});

/// A compiler path as the first word, optionally behind Xcode's driver shim.
static COMPILER_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:builtin-SwiftDriver\s+--\s+)?(?:\\.|[^\s\\])*/(?:swiftc|clang\+\+|clang)(?:\s|$)")
        .expect("valid compiler command pattern")
});

const FAILURE_MARKERS: &[&str] = &["** BUILD FAILED **", "** ARCHIVE FAILED **"];

/// A log line that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogWarning {
    /// 1-based line number.
    pub line: usize,
    pub message: String,
}

/// The per-target invocations recovered from a log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLog {
    /// Target name -> invocations, in log order.
    pub invocations: BTreeMap<String, Vec<CompilerInvocation>>,
    /// Every target whose section was seen, in first-seen order.
    pub targets: Vec<String>,
    pub warnings: Vec<LogWarning>,
    /// Whether the log reports that the build itself failed.
    pub build_failed: bool,
}

impl ParsedLog {
    /// Total invocation count across targets.
    pub fn invocation_count(&self) -> usize {
        self.invocations.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    InTarget(String),
}

#[derive(Debug)]
struct Pending {
    text: String,
    start_line: usize,
}

/// Incremental build log parser.
///
/// Feed lines in order with [`feed`](Self::feed) and call
/// [`finish`](Self::finish) at end of input; [`parse`](Self::parse) does both.
#[derive(Debug)]
pub struct LogParser {
    state: State,
    line_number: usize,
    working_dir: Option<PathBuf>,
    pending: Option<Pending>,
    log: ParsedLog,
}

impl Default for LogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogParser {
    pub fn new() -> Self {
        LogParser {
            state: State::Idle,
            line_number: 0,
            working_dir: None,
            pending: None,
            log: ParsedLog::default(),
        }
    }

    /// Parse a complete sequence of lines.
    pub fn parse<I, S>(lines: I) -> ParsedLog
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parser = LogParser::new();
        for line in lines {
            parser.feed(line.as_ref());
        }
        parser.finish()
    }

    /// Process the next line of the log.
    pub fn feed(&mut self, line: &str) {
        self.line_number += 1;
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(mut pending) = self.pending.take() {
            if target_marker(line).is_none() {
                pending.text.push(' ');
                pending.text.push_str(args::strip_continuation(line).trim_start());
                if args::is_continued(line) {
                    self.pending = Some(pending);
                } else {
                    self.complete(pending);
                }
                return;
            }
            // A boundary cuts the continuation short.
            self.warn(pending.start_line, "line continuation interrupted by a target boundary");
            self.complete(pending);
        }

        let trimmed = line.trim();

        if FAILURE_MARKERS.iter().any(|m| trimmed.contains(m)) {
            tracing::warn!("build log reports a failed build (line {})", self.line_number);
            self.log.build_failed = true;
            return;
        }

        if let Some(target) = target_marker(trimmed) {
            self.enter_target(target);
            return;
        }

        if trimmed.is_empty() {
            self.working_dir = None;
            return;
        }

        if let Some(dir) = trimmed.strip_prefix("cd ") {
            self.working_dir = args::split(dir)
                .ok()
                .and_then(|mut words| (!words.is_empty()).then(|| words.remove(0)))
                .map(PathBuf::from);
            return;
        }

        if COMPILER_COMMAND.is_match(trimmed) {
            let pending = Pending {
                text: args::strip_continuation(trimmed).to_string(),
                start_line: self.line_number,
            };
            if args::is_continued(trimmed) {
                self.pending = Some(pending);
            } else {
                self.complete(pending);
            }
        }
    }

    /// Flush any open command and return the result.
    pub fn finish(mut self) -> ParsedLog {
        if let Some(pending) = self.pending.take() {
            self.warn(pending.start_line, "line continuation still open at end of input");
            self.complete(pending);
        }

        tracing::debug!(
            "parsed {} invocation(s) across {} target(s), {} warning(s)",
            self.log.invocation_count(),
            self.log.invocations.len(),
            self.log.warnings.len()
        );
        self.log
    }

    fn enter_target(&mut self, target: &str) {
        if self.state != State::InTarget(target.to_string()) {
            if !self.log.targets.iter().any(|t| t == target) {
                tracing::debug!("found target `{}`", target);
                self.log.targets.push(target.to_string());
            }
            self.state = State::InTarget(target.to_string());
        }
        self.working_dir = None;
    }

    fn complete(&mut self, pending: Pending) {
        let State::InTarget(target) = &self.state else {
            self.warn(pending.start_line, "compiler invocation outside of any target section");
            return;
        };
        let target = target.clone();

        let mut words = match args::split(&pending.text) {
            Ok(words) => words,
            Err(e) => {
                self.warn(pending.start_line, format!("malformed compiler invocation: {}", e));
                return;
            }
        };

        if words.first().is_some_and(|w| w.starts_with("builtin-")) {
            match words.iter().position(|w| w == "--") {
                Some(pos) => {
                    words.drain(..=pos);
                }
                None => {
                    self.warn(pending.start_line, "driver shim without `--` separator");
                    return;
                }
            }
        }

        let working_dir = self.working_dir.clone();
        match CompilerInvocation::from_words(&target, words, working_dir, pending.start_line) {
            Ok(Some(invocation)) => {
                tracing::trace!(
                    "`{}`: {} invocation for `{}`",
                    target,
                    invocation.compiler,
                    invocation.module_name
                );
                self.log.invocations.entry(target).or_default().push(invocation);
            }
            Ok(None) => {
                tracing::debug!("line {}: not a compile step", pending.start_line);
            }
            Err(message) => self.warn(pending.start_line, message),
        }
    }

    fn warn(&mut self, line: usize, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("build log line {}: {}", line, message);
        self.log.warnings.push(LogWarning { line, message });
    }
}

/// The target named by a boundary line, if it is one.
fn target_marker(line: &str) -> Option<&str> {
    let line = line.trim();
    BUILD_TARGET_HEADER
        .captures(line)
        .or_else(|| LEGACY_TARGET_HEADER.captures(line))
        .or_else(|| IN_TARGET_SUFFIX.captures(line))
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim())
}
