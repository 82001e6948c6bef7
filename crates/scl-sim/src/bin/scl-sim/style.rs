//! Shared styling helpers for CLI output.

use std::io::IsTerminal;

use owo_colors::OwoColorize;
use scl_sim::autotest::{LogKind, TestLogLine};

fn should_color() -> bool {
    std::io::stdout().is_terminal()
}

pub fn success(text: impl AsRef<str>) -> String {
    let text = text.as_ref();
    if should_color() {
        format!("{}", text.green())
    } else {
        text.to_string()
    }
}

pub fn error(text: impl AsRef<str>) -> String {
    let text = text.as_ref();
    if should_color() {
        format!("{}", text.red())
    } else {
        text.to_string()
    }
}

pub fn accent(text: impl AsRef<str>) -> String {
    let text = text.as_ref();
    if should_color() {
        format!("{}", text.cyan())
    } else {
        text.to_string()
    }
}

pub fn muted(text: impl AsRef<str>) -> String {
    let text = text.as_ref();
    if should_color() {
        format!("{}", text.dimmed())
    } else {
        text.to_string()
    }
}

pub fn change(text: impl AsRef<str>) -> String {
    let text = text.as_ref();
    if should_color() {
        format!("{}", text.yellow())
    } else {
        text.to_string()
    }
}

/// Test log line colored by its kind.
pub fn log_line(line: &TestLogLine) -> String {
    match line.kind {
        LogKind::Header => accent(&line.text),
        LogKind::Step | LogKind::Summary => format!("\n{}", line.text),
        LogKind::Input | LogKind::NoChange => muted(&line.text),
        LogKind::Change => change(&line.text),
        LogKind::Pass => success(&line.text),
        LogKind::Fail | LogKind::Error => error(&line.text),
    }
}
