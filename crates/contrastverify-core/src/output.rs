//! Severity-prefixed output, GitHub Actions aware.
//!
//! Outside GitHub Actions, messages go to stdout with `DEBUG:`/`INFO:`/
//! `NOTICE:`/`WARNING:`/`ERROR:` prefixes (debug only when the `DEBUG`
//! environment variable is set). Under GitHub Actions the same calls emit
//! workflow commands, and a Markdown step summary can be appended when
//! `GITHUB_STEP_SUMMARY` names a writable file.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;

pub struct OutputHelper {
    github_actions: bool,
    debug_enabled: bool,
    summary_path: Option<PathBuf>,
}

impl OutputHelper {
    pub fn is_github_actions() -> bool {
        std::env::var("GITHUB_ACTIONS").as_deref() == Ok("true")
    }

    pub fn from_env() -> Self {
        let github_actions = Self::is_github_actions();
        let debug_enabled = github_actions || std::env::var_os("DEBUG").is_some();

        let summary_path = if github_actions {
            std::env::var("GITHUB_STEP_SUMMARY")
                .ok()
                .filter(|path| !path.is_empty())
                .map(PathBuf::from)
        } else {
            None
        };

        let helper = Self {
            github_actions,
            debug_enabled,
            summary_path,
        };

        if github_actions && helper.summary_path.is_none() {
            helper.warning("No path when configuring summary writer - no summary will be written");
        } else if !github_actions {
            helper.debug("Not running in GitHub Actions, so no summary will be written");
        }

        helper
    }

    pub fn debug(&self, message: &str) {
        if self.github_actions {
            println!("::debug::{message}");
        } else if self.debug_enabled {
            println!("DEBUG: {message}");
        }
    }

    pub fn info(&self, message: &str) {
        if self.github_actions {
            println!("{message}");
        } else {
            println!("INFO: {message}");
        }
    }

    pub fn notice(&self, message: &str) {
        if self.github_actions {
            println!("::notice::{message}");
        } else {
            println!("NOTICE: {message}");
        }
    }

    pub fn warning(&self, message: &str) {
        if self.github_actions {
            println!("::warning::{message}");
        } else {
            println!("WARNING: {message}");
        }
    }

    pub fn error(&self, message: &str) {
        if self.github_actions {
            println!("::error::{message}");
        } else {
            println!("ERROR: {message}");
        }
    }

    /// Appends Markdown to the step summary file. A no-op outside GitHub
    /// Actions or when no summary path is configured.
    pub fn write_summary(&self, markdown: &str) {
        let Some(path) = &self.summary_path else {
            return;
        };
        let appended = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "{markdown}"));
        if let Err(err) = appended {
            self.warning(&format!(
                "OSError configuring summary writer for {} - no summary will be written - {err}",
                path.display()
            ));
        }
    }
}
