//! Terminal prompts for target selection.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::application::{ReuseChoice, TargetPrompter};

/// Line-based prompter over any reader/writer pair.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompter<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Prompter on the process's stdin/stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read one trimmed line; `None` on EOF or read error.
    fn read_line(&mut self) -> Option<String> {
        let _ = self.output.flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl<R: BufRead, W: Write> TargetPrompter for TerminalPrompter<R, W> {
    fn choose_reuse(&mut self, remembered: &Path, options: &[ReuseChoice; 2]) -> Option<ReuseChoice> {
        let _ = writeln!(self.output, "Last sync target: {}", remembered.display().to_string().cyan());
        for (i, option) in options.iter().enumerate() {
            let _ = writeln!(self.output, "  {}. {}", i + 1, option.label());
        }

        loop {
            let _ = write!(self.output, "Select [1], or q to cancel: ");
            let answer = self.read_line()?;
            match answer.as_str() {
                "" => return Some(options[0]),
                "q" | "Q" => return None,
                other => match other.parse::<usize>() {
                    Ok(n) if (1..=options.len()).contains(&n) => return Some(options[n - 1]),
                    _ => {
                        if let Some(option) = options.iter().find(|o| o.label().eq_ignore_ascii_case(other)) {
                            return Some(*option);
                        }
                        let _ = writeln!(self.output, "{}", "Please answer 1 or 2.".yellow());
                    }
                },
            }
        }
    }

    fn choose_target(&mut self, start_dir: Option<&Path>) -> Option<PathBuf> {
        match start_dir {
            Some(dir) => {
                let _ = write!(self.output, "Target file (relative to {}), empty to cancel: ", dir.display());
            }
            None => {
                let _ = write!(self.output, "Target file, empty to cancel: ");
            }
        }

        let answer = self.read_line()?;
        if answer.is_empty() {
            return None;
        }

        let path = PathBuf::from(answer);
        Some(match start_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        })
    }
}

/// Prompter that always picks a given target, for non-interactive runs.
pub struct FixedTarget {
    target: PathBuf,
}

impl FixedTarget {
    #[must_use]
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl TargetPrompter for FixedTarget {
    fn choose_reuse(&mut self, remembered: &Path, _options: &[ReuseChoice; 2]) -> Option<ReuseChoice> {
        if remembered == self.target {
            Some(ReuseChoice::Reuse)
        } else {
            Some(ReuseChoice::ChooseNew)
        }
    }

    fn choose_target(&mut self, _start_dir: Option<&Path>) -> Option<PathBuf> {
        Some(self.target.clone())
    }
}
