//! Test script statements.
//!
//! One statement per line; blank lines and `//` comments are skipped.
//! Keywords are case-insensitive, paths are not validated here.

use smol_str::SmolStr;

use crate::error::SimError;

/// Unit of a `RUN` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunUnit {
    Scans,
    Ms,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `SET <path> = <value>`
    Set { path: SmolStr, value: SmolStr },
    /// `RUN <n> SCANS` or `RUN <n> MS`
    Run { amount: u64, unit: RunUnit },
    /// `ASSERT <path> == <value>`
    Assert { path: SmolStr, expected: SmolStr },
}

/// Trimmed statement lines with their 1-based line numbers.
pub fn statement_lines(script: &str) -> impl Iterator<Item = (usize, &str)> {
    script
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with("//"))
}

fn script_error(line: usize, message: &str) -> SimError {
    SimError::Script {
        line,
        message: message.into(),
    }
}

/// Splits off a leading keyword followed by whitespace.
fn keyword<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let head = text.get(..word.len())?;
    let rest = &text[word.len()..];
    (head.eq_ignore_ascii_case(word) && rest.starts_with(char::is_whitespace))
        .then(|| rest.trim_start())
}

fn is_path_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '[' | ']' | '.')
}

/// `<path> <op> <value>`, where `op` is one of `ops` tried in order.
fn path_and_value<'a>(text: &'a str, ops: &[&str]) -> Option<(&'a str, &'a str)> {
    let end = text.find(|ch: char| !is_path_char(ch)).unwrap_or(text.len());
    let (path, rest) = text.split_at(end);
    if path.is_empty() {
        return None;
    }
    let rest = rest.trim_start();
    let value = ops.iter().find_map(|op| rest.strip_prefix(op))?.trim();
    (!value.is_empty()).then_some((path, value))
}

impl Statement {
    pub fn parse(line: usize, text: &str) -> Result<Self, SimError> {
        let text = text.trim();
        if let Some(rest) = keyword(text, "SET") {
            let (path, value) =
                path_and_value(rest, &["="]).ok_or_else(|| script_error(line, "Invalid SET syntax."))?;
            return Ok(Statement::Set {
                path: path.into(),
                value: value.into(),
            });
        }
        if let Some(rest) = keyword(text, "RUN") {
            return Self::parse_run(rest).ok_or_else(|| script_error(line, "Invalid RUN syntax."));
        }
        if let Some(rest) = keyword(text, "ASSERT") {
            let (path, expected) = path_and_value(rest, &["==", "="])
                .ok_or_else(|| script_error(line, "Invalid ASSERT syntax."))?;
            return Ok(Statement::Assert {
                path: path.into(),
                expected: expected.into(),
            });
        }
        Err(script_error(line, "Unknown command."))
    }

    fn parse_run(rest: &str) -> Option<Self> {
        let mut words = rest.split_whitespace();
        let amount = words.next()?;
        if !amount.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let amount = amount.parse().ok()?;
        let unit = match words.next()?.to_ascii_uppercase().as_str() {
            "SCAN" | "SCANS" => RunUnit::Scans,
            "MS" => RunUnit::Ms,
            _ => return None,
        };
        Some(Statement::Run { amount, unit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> String {
        match Statement::parse(4, text) {
            Err(SimError::Script { line, message }) => {
                assert_eq!(line, 4);
                message.to_string()
            }
            other => panic!("expected a script error, got {other:?}"),
        }
    }

    #[test]
    fn parses_the_three_verbs() {
        assert_eq!(
            Statement::parse(1, "SET Motor.Speed[2] = 12.5").unwrap(),
            Statement::Set {
                path: "Motor.Speed[2]".into(),
                value: "12.5".into()
            }
        );
        assert_eq!(
            Statement::parse(1, "run 3 scan").unwrap(),
            Statement::Run {
                amount: 3,
                unit: RunUnit::Scans
            }
        );
        assert_eq!(
            Statement::parse(1, "RUN 1500 ms").unwrap(),
            Statement::Run {
                amount: 1500,
                unit: RunUnit::Ms
            }
        );
        assert_eq!(
            Statement::parse(1, "ASSERT Done == TRUE").unwrap(),
            Statement::Assert {
                path: "Done".into(),
                expected: "TRUE".into()
            }
        );
        assert_eq!(
            Statement::parse(1, "assert Count=3").unwrap(),
            Statement::Assert {
                path: "Count".into(),
                expected: "3".into()
            }
        );
    }

    #[test]
    fn malformed_lines_name_the_verb() {
        assert_eq!(message("SET Start TRUE"), "Invalid SET syntax.");
        assert_eq!(message("SET Start ="), "Invalid SET syntax.");
        assert_eq!(message("RUN -5 SCANS"), "Invalid RUN syntax.");
        assert_eq!(message("RUN 5 SECONDS"), "Invalid RUN syntax.");
        assert_eq!(message("ASSERT Done != TRUE"), "Invalid ASSERT syntax.");
        assert_eq!(message("WAIT 10"), "Unknown command.");
        assert_eq!(message("SETX = 1"), "Unknown command.");
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let script = "// setup\n\n  SET A = 1  \n// done\nRUN 1 SCANS\n";
        let lines: Vec<_> = statement_lines(script).collect();
        assert_eq!(lines, vec![(3, "SET A = 1"), (5, "RUN 1 SCANS")]);
    }
}
