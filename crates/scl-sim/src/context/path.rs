//! Memory paths: `name`, `name[3]`, `name.field`, `name.field[2]`, `timer.Q`.

use std::fmt;

use smol_str::SmolStr;

use crate::error::SimError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(SmolStr),
    Index(i64),
}

/// Parsed memory path rooted at a declared variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarPath {
    pub root: SmolStr,
    pub segments: Vec<PathSegment>,
}

impl VarPath {
    /// Parses a path. Siemens `#` prefixes and `"quoted"` names are accepted.
    pub fn parse(text: &str) -> Result<Self, SimError> {
        let invalid = || SimError::InvalidPath(SmolStr::new(text.trim()));
        let mut rest = text.trim();
        rest = rest.strip_prefix('#').unwrap_or(rest);
        let (root, tail) = take_name(rest).ok_or_else(invalid)?;
        rest = tail;

        let mut segments = Vec::new();
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            if let Some(after_dot) = rest.strip_prefix('.') {
                let (field, tail) = take_name(after_dot.trim_start()).ok_or_else(invalid)?;
                segments.push(PathSegment::Field(field));
                rest = tail;
            } else if let Some(after_bracket) = rest.strip_prefix('[') {
                let close = after_bracket.find(']').ok_or_else(invalid)?;
                let index = after_bracket[..close]
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| invalid())?;
                segments.push(PathSegment::Index(index));
                rest = &after_bracket[close + 1..];
            } else {
                return Err(invalid());
            }
        }
        Ok(Self { root, segments })
    }
}

fn take_name(text: &str) -> Option<(SmolStr, &str)> {
    if let Some(quoted) = text.strip_prefix('"') {
        let close = quoted.find('"')?;
        let name = &quoted[..close];
        if name.is_empty() {
            return None;
        }
        return Some((SmolStr::new(name), &quoted[close + 1..]));
    }
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    if end == 0 || text.as_bytes()[0].is_ascii_digit() {
        return None;
    }
    Some((SmolStr::new(&text[..end]), &text[end..]))
}

impl fmt::Display for VarPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)?;
        for segment in &self.segments {
            match segment {
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chains() {
        let path = VarPath::parse("#motor.history[ -1 ]").unwrap();
        assert_eq!(path.root, "motor");
        assert_eq!(
            path.segments,
            vec![
                PathSegment::Field("history".into()),
                PathSegment::Index(-1)
            ]
        );
        assert_eq!(path.to_string(), "motor.history[-1]");
        assert_eq!(VarPath::parse("\"Start Button\"").unwrap().root, "Start Button");
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(VarPath::parse("").is_err());
        assert!(VarPath::parse("1abc").is_err());
        assert!(VarPath::parse("a[x]").is_err());
        assert!(VarPath::parse("a[1").is_err());
        assert!(VarPath::parse("a.").is_err());
        assert!(VarPath::parse("a + b").is_err());
    }
}
