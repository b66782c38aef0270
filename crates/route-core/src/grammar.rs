//! Route string tokens and segment grouping.
//!
//! ```text
//! route   := [ICAO] body [ICAO]
//! body    := segment (segment)*
//! segment := waypoint | airway | "DCT" | "AUTO" | "RAND" | coordinate
//! ```
//!
//! Commands (`AUTO`, `RAND`) stand alone between literal runs and may never
//! follow one another.

use std::fmt;

use crate::coords::{parse_coordinate, LatLon};
use crate::error::{Result, RouteError};
use crate::models::{Waypoint, DIRECT};

pub const AUTO: &str = "AUTO";
pub const RAND: &str = "RAND";

/// One word of a route string.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Waypoint, airway, procedure or airport identifier. Which one depends
    /// on position and on what the graph knows.
    Ident(String),
    Direct,
    Auto,
    Rand,
    Coordinate { text: String, position: LatLon },
}

impl Token {
    pub fn classify(text: &str) -> Result<Token> {
        let token = match text {
            DIRECT => Token::Direct,
            AUTO => Token::Auto,
            RAND => Token::Rand,
            _ => match parse_coordinate(text)? {
                Some(position) => Token::Coordinate {
                    text: text.to_string(),
                    position,
                },
                None => Token::Ident(text.to_string()),
            },
        };
        Ok(token)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Token::Ident(text) => text,
            Token::Direct => DIRECT,
            Token::Auto => AUTO,
            Token::Rand => RAND,
            Token::Coordinate { text, .. } => text,
        }
    }

    /// The waypoint a coordinate literal stands for, as injected into the graph.
    pub fn coordinate_waypoint(&self) -> Option<Waypoint> {
        match self {
            Token::Coordinate { text, position } => {
                Some(Waypoint::new(text.as_str(), position.lat, position.lon))
            }
            _ => None,
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self, Token::Auto | Token::Rand)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tokenized route description, consumed left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteString {
    tokens: Vec<Token>,
}

impl RouteString {
    /// Split on whitespace and classify each word. Input is upper-cased.
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = text
            .split_whitespace()
            .map(|word| Token::classify(&word.to_ascii_uppercase()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { tokens })
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Reject two adjacent commands anywhere in the string.
    pub fn ensure_no_consecutive_commands(&self) -> Result<()> {
        for pair in self.tokens.windows(2) {
            if pair[0].is_command() && pair[1].is_command() {
                return Err(RouteError::grammar(format!(
                    "{} cannot be followed by {}",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(())
    }

    /// Drop a leading origin ICAO and a trailing destination ICAO when present.
    pub fn strip_icaos(mut self, orig_icao: &str, dest_icao: &str) -> Self {
        if self.tokens.first().map(Token::as_str) == Some(orig_icao) {
            self.tokens.remove(0);
        }
        if self.tokens.last().map(Token::as_str) == Some(dest_icao) {
            self.tokens.pop();
        }
        self
    }

    /// Every coordinate literal, in order of appearance.
    pub fn coordinates(&self) -> impl Iterator<Item = (&str, LatLon)> {
        self.tokens.iter().filter_map(|token| match token {
            Token::Coordinate { text, position } => Some((text.as_str(), *position)),
            _ => None,
        })
    }
}

impl fmt::Display for RouteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, token) in self.tokens.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

/// A maximal run of literal tokens, or a lone command.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(Vec<Token>),
    Auto,
    Rand,
}

/// Group tokens into segments in a single left-to-right scan.
pub fn group(tokens: &[Token]) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut previous: Option<&Token> = None;

    for token in tokens {
        if token.is_command() {
            if let Some(prev) = previous.filter(|prev| prev.is_command()) {
                return Err(RouteError::grammar(format!(
                    "{} cannot be followed by {}",
                    prev, token
                )));
            }
            if !current.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut current)));
            }
            segments.push(if *token == Token::Auto {
                Segment::Auto
            } else {
                Segment::Rand
            });
        } else {
            current.push(token.clone());
        }
        previous = Some(token);
    }

    if !current.is_empty() {
        segments.push(Segment::Literal(current));
    }
    Ok(segments)
}

/// Inverse of [`group`].
pub fn flatten(segments: &[Segment]) -> Vec<Token> {
    let mut tokens = Vec::new();
    for segment in segments {
        match segment {
            Segment::Literal(run) => tokens.extend(run.iter().cloned()),
            Segment::Auto => tokens.push(Token::Auto),
            Segment::Rand => tokens.push(Token::Rand),
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<Token> {
        RouteString::parse(text).unwrap().into_tokens()
    }

    #[test]
    fn test_classify() {
        assert_eq!(Token::classify("DCT").unwrap(), Token::Direct);
        assert_eq!(Token::classify("AUTO").unwrap(), Token::Auto);
        assert_eq!(Token::classify("RAND").unwrap(), Token::Rand);
        assert_eq!(Token::classify("J146").unwrap(), Token::Ident("J146".into()));
        assert!(matches!(Token::classify("N50W020").unwrap(), Token::Coordinate { .. }));
    }

    #[test]
    fn test_parse_uppercases() {
        let route = RouteString::parse("  sunst  j146 dct ").unwrap();
        assert_eq!(route.to_string(), "SUNST J146 DCT");
    }

    #[test]
    fn test_group_commands_between_literals() {
        let segments = group(&tokens("AUTO A J1 B RAND C AUTO")).unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Auto,
                Segment::Literal(tokens("A J1 B")),
                Segment::Rand,
                Segment::Literal(tokens("C")),
                Segment::Auto,
            ]
        );
    }

    #[test]
    fn test_group_empty() {
        assert!(group(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_group_then_flatten_preserves_tokens() {
        for text in ["A", "AUTO", "A AUTO B", "RAND A B DCT C AUTO", "A B C"] {
            let original = tokens(text);
            let segments = group(&original).unwrap();
            assert_eq!(flatten(&segments), original, "{}", text);
        }
    }

    #[test]
    fn test_consecutive_commands_rejected() {
        for (a, b) in [("AUTO", "AUTO"), ("AUTO", "RAND"), ("RAND", "AUTO"), ("RAND", "RAND")] {
            let text = format!("A {} {} B", a, b);
            let route = RouteString::parse(&text).unwrap();
            assert!(route.ensure_no_consecutive_commands().is_err(), "{}", text);
            assert!(group(route.tokens()).is_err(), "{}", text);
        }
    }

    #[test]
    fn test_strip_icaos() {
        let route = RouteString::parse("KLAX A B KSFO").unwrap().strip_icaos("KLAX", "KSFO");
        assert_eq!(route.to_string(), "A B");

        let route = RouteString::parse("A B").unwrap().strip_icaos("KLAX", "KSFO");
        assert_eq!(route.to_string(), "A B");

        let route = RouteString::parse("KLAX").unwrap().strip_icaos("KLAX", "KLAX");
        assert!(route.is_empty(), "a lone ICAO is removed once");
    }

    #[test]
    fn test_coordinates_listed() {
        let route = RouteString::parse("A N50W020 B 5020N").unwrap();
        let found: Vec<&str> = route.coordinates().map(|(text, _)| text).collect();
        assert_eq!(found, vec!["N50W020", "5020N"]);
    }
}
