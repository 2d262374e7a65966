//! Line protocol message framing
//!
//! ```text
//! <header> [<arg> ...]\n
//! ```
//!
//! Tokens are separated by a single ASCII space, with no quoting or escaping.
//! Consecutive spaces are not collapsed: `river  1` has the arguments `["", "1"]`.

use std::fmt;

/// Token separator on the wire
pub const SEPARATOR: char = ' ';

/// One parsed protocol line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: String,
    /// Arguments in wire order, header excluded
    pub arguments: Vec<String>,
}

impl Message {
    /// Split a trimmed line into header and arguments
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split(SEPARATOR);
        // split always yields at least one element
        let header = parts.next().unwrap_or_default().to_string();
        let arguments = parts.map(str::to_string).collect();

        Self { header, arguments }
    }

    pub fn args(&self) -> Vec<&str> {
        self.arguments.iter().map(String::as_str).collect()
    }

    /// The line this message was parsed from
    pub fn line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header)?;
        for arg in &self.arguments {
            write!(f, "{SEPARATOR}{arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_only() {
        let msg = Message::parse("river");
        assert_eq!(msg.header, "river");
        assert!(msg.arguments.is_empty());
    }

    #[test]
    fn test_header_and_arguments_in_order() {
        let msg = Message::parse("foo bar baz");
        assert_eq!(msg.header, "foo");
        assert_eq!(msg.args(), vec!["bar", "baz"]);
    }

    #[test]
    fn test_consecutive_spaces_make_empty_tokens() {
        let msg = Message::parse("river  1");
        assert_eq!(msg.header, "river");
        assert_eq!(msg.args(), vec!["", "1"]);
    }

    #[test]
    fn test_only_space_separates() {
        let msg = Message::parse("river\t1");
        assert_eq!(msg.header, "river\t1");
        assert!(msg.arguments.is_empty());
    }

    #[test]
    fn test_header_is_case_sensitive_text() {
        assert_eq!(Message::parse("River 1").header, "River");
    }

    #[test]
    fn test_line_reconstructs_input() {
        for line in ["river 1", "foo bar baz", "river  1", "a  b   c"] {
            assert_eq!(Message::parse(line).line(), line);
        }
    }
}
