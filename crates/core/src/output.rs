//! Output Sink
//!
//! User-facing messages and progress indicators. Components report through
//! an `Arc<dyn Output>` handed to them; they never decide how things are
//! rendered. Diagnostics go through `tracing` independently.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

/// Progress indicator with a known completion fraction
pub trait FiniteProgress: Send {
    /// Set progress, `fraction` is clamped to `[0, 1]`
    fn update(&mut self, fraction: f64);
    /// Finish the indicator, optionally replacing its label
    fn done(&mut self, message: Option<&str>);
}

/// Progress indicator without a known end, showing a status tag
pub trait InfiniteProgress: Send {
    fn update(&mut self, tag: &str);
    fn done(&mut self, message: Option<&str>);
}

/// User output sink
pub trait Output: Send + Sync {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
    /// Emphasized line, used for produced packages
    fn highlight(&self, message: &str);
    fn create_finite_progress(&self, label: &str) -> Box<dyn FiniteProgress>;
    fn create_infinite_progress(&self, label: &str) -> Box<dyn InfiniteProgress>;
}

/// Terminal output using indicatif bars
#[derive(Debug, Default)]
pub struct TerminalOutput {
    /// Suppress info and progress lines
    quiet: bool,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

impl Output for TerminalOutput {
    fn info(&self, message: &str) {
        debug!("{}", message);
        if !self.quiet {
            println!("  * {}", message);
        }
    }

    fn warning(&self, message: &str) {
        warn!("{}", message);
        eprintln!("  + WARNING: {}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
        eprintln!("  ! ERROR: {}", message);
    }

    fn highlight(&self, message: &str) {
        info!("{}", message);
        println!("  * \x1b[1m{}\x1b[0m", message);
    }

    fn create_finite_progress(&self, label: &str) -> Box<dyn FiniteProgress> {
        let bar = if self.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(100)
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  * {msg} [{bar:20.cyan/blue}]")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        bar.set_message(label.to_string());
        Box::new(TerminalFiniteProgress { bar })
    }

    fn create_infinite_progress(&self, label: &str) -> Box<dyn InfiniteProgress> {
        let bar = if self.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  * {spinner} {prefix} [{msg}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        Box::new(TerminalInfiniteProgress { bar })
    }
}

struct TerminalFiniteProgress {
    bar: ProgressBar,
}

impl FiniteProgress for TerminalFiniteProgress {
    fn update(&mut self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.bar.set_position((fraction * 100.0).round() as u64);
    }

    fn done(&mut self, message: Option<&str>) {
        match message {
            Some(msg) if !msg.is_empty() => self.bar.finish_with_message(msg.to_string()),
            _ => self.bar.finish(),
        }
    }
}

struct TerminalInfiniteProgress {
    bar: ProgressBar,
}

impl InfiniteProgress for TerminalInfiniteProgress {
    fn update(&mut self, tag: &str) {
        self.bar.set_message(tag.to_string());
    }

    fn done(&mut self, message: Option<&str>) {
        self.bar
            .finish_with_message(message.unwrap_or("done").to_string());
    }
}

/// Output that only forwards to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentOutput;

impl Output for SilentOutput {
    fn info(&self, message: &str) {
        debug!("{}", message);
    }

    fn warning(&self, message: &str) {
        warn!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }

    fn highlight(&self, message: &str) {
        info!("{}", message);
    }

    fn create_finite_progress(&self, _label: &str) -> Box<dyn FiniteProgress> {
        Box::new(NullProgress)
    }

    fn create_infinite_progress(&self, _label: &str) -> Box<dyn InfiniteProgress> {
        Box::new(NullProgress)
    }
}

struct NullProgress;

impl FiniteProgress for NullProgress {
    fn update(&mut self, _fraction: f64) {}
    fn done(&mut self, _message: Option<&str>) {}
}

impl InfiniteProgress for NullProgress {
    fn update(&mut self, _tag: &str) {}
    fn done(&mut self, _message: Option<&str>) {}
}

/// Kind of a recorded message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Warning,
    Error,
    Highlight,
    /// Progress indicator created, the text is its label
    Progress,
}

/// Output that records everything, for tests and log capture
#[derive(Debug, Default)]
pub struct MemoryOutput {
    messages: std::sync::Arc<Mutex<Vec<(MessageKind, String)>>>,
    fractions: std::sync::Arc<Mutex<Vec<f64>>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded messages
    pub fn messages(&self) -> Vec<(MessageKind, String)> {
        self.messages.lock().clone()
    }

    /// Recorded messages of one kind
    pub fn of_kind(&self, kind: MessageKind) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Whether any message of `kind` contains `needle`
    pub fn contains(&self, kind: MessageKind, needle: &str) -> bool {
        self.of_kind(kind).iter().any(|m| m.contains(needle))
    }

    /// Every fraction reported to finite progress indicators
    pub fn fractions(&self) -> Vec<f64> {
        self.fractions.lock().clone()
    }

    fn push(&self, kind: MessageKind, message: &str) {
        self.messages.lock().push((kind, message.to_string()));
    }
}

impl Output for MemoryOutput {
    fn info(&self, message: &str) {
        self.push(MessageKind::Info, message);
    }

    fn warning(&self, message: &str) {
        self.push(MessageKind::Warning, message);
    }

    fn error(&self, message: &str) {
        self.push(MessageKind::Error, message);
    }

    fn highlight(&self, message: &str) {
        self.push(MessageKind::Highlight, message);
    }

    fn create_finite_progress(&self, label: &str) -> Box<dyn FiniteProgress> {
        self.push(MessageKind::Progress, label);
        Box::new(MemoryProgress {
            fractions: self.fractions.clone(),
        })
    }

    fn create_infinite_progress(&self, label: &str) -> Box<dyn InfiniteProgress> {
        self.push(MessageKind::Progress, label);
        Box::new(MemoryProgress {
            fractions: self.fractions.clone(),
        })
    }
}

struct MemoryProgress {
    fractions: std::sync::Arc<Mutex<Vec<f64>>>,
}

impl FiniteProgress for MemoryProgress {
    fn update(&mut self, fraction: f64) {
        self.fractions.lock().push(fraction.clamp(0.0, 1.0));
    }

    fn done(&mut self, _message: Option<&str>) {}
}

impl InfiniteProgress for MemoryProgress {
    fn update(&mut self, _tag: &str) {}
    fn done(&mut self, _message: Option<&str>) {}
}
