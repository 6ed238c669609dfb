//! Where build log lines come from.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::parser::{LogParser, ParsedLog};

/// Argument value that selects standard input.
pub const STDIN_ARG: &str = "-";

/// A build log: a file on disk or piped standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSource {
    File(PathBuf),
    Stdin,
}

impl LogSource {
    /// Interpret a command-line argument; `-` selects stdin.
    pub fn from_arg(arg: &str) -> Self {
        if arg == STDIN_ARG {
            LogSource::Stdin
        } else {
            LogSource::File(PathBuf::from(arg))
        }
    }

    pub fn is_stdin(&self) -> bool {
        matches!(self, LogSource::Stdin)
    }

    /// Read the whole log through a [`LogParser`].
    ///
    /// Lines are handed to the parser as they arrive. `echo` is called with
    /// every line first, which lets piped build output pass through.
    pub fn parse<F>(&self, mut echo: F) -> Result<ParsedLog>
    where
        F: FnMut(&str),
    {
        let mut parser = LogParser::new();
        let mut feed = |line: &str| {
            echo(line);
            parser.feed(line);
        };

        match self {
            LogSource::File(path) => {
                tracing::info!("reading build log from {}", path.display());
                let file = File::open(path)
                    .with_context(|| format!("failed to open build log: {}", path.display()))?;
                for_each_line(BufReader::new(file), &mut feed)
                    .with_context(|| format!("failed to read build log: {}", path.display()))?;
            }
            LogSource::Stdin => {
                tracing::info!("reading build log from stdin");
                for_each_line(io::stdin().lock(), &mut feed).context("failed to read stdin")?;
            }
        }

        Ok(parser.finish())
    }

    /// A short description for messages.
    pub fn describe(&self) -> String {
        match self {
            LogSource::File(path) => path.display().to_string(),
            LogSource::Stdin => "<stdin>".to_string(),
        }
    }
}

/// Call `f` with each line of `reader`, without the line terminator.
///
/// Invalid UTF-8 is replaced rather than rejected; Xcode logs occasionally
/// contain raw bytes from tool output.
pub fn for_each_line<R, F>(mut reader: R, mut f: F) -> io::Result<()>
where
    R: BufRead,
    F: FnMut(&str),
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        while buf.last().is_some_and(|&b| b == b'\n' || b == b'\r') {
            buf.pop();
        }
        f(&String::from_utf8_lossy(&buf));
    }
}
