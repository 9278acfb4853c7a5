//! Line-oriented G-code tokenizer.
//!
//! A line is cut at the first `;`, split on whitespace, and the first token is
//! matched against the closed set of modal commands this crate understands.
//! Parameter words are only parsed for recognized commands, so vendor commands
//! with free-form arguments (`M117 Hello`) are tallied rather than rejected.

use std::ops::Range;

use super::GCodeError;

/// Span of a token in the source line (byte offsets, comment already removed).
/// Malformed words are reported by the column where their span starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GCodeSpan {
    pub range: Range<usize>,
}

/// Modal or motion command selected by the first token of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// G0 (`rapid`) or G1.
    LinearMove { rapid: bool },
    /// G4, M0 or M1.
    Dwell,
    /// G90
    AbsolutePositioning,
    /// G91
    RelativePositioning,
    /// M82
    AbsoluteExtrusion,
    /// M83
    RelativeExtrusion,
    /// G20
    UnitsInches,
    /// G21
    UnitsMillimeters,
    /// G92
    SetPosition,
    /// Anything else, keyed by the upper-cased mnemonic as written.
    Unrecognized(String),
}

impl Command {
    /// Match a mnemonic token. `G01` and `g1` both select G1; fractional
    /// numbers such as `G29.1` are unrecognized.
    pub fn from_mnemonic(token: &str) -> Self {
        let upper = token.to_ascii_uppercase();
        let mut chars = upper.chars();
        let letter = chars.next();
        let digits = chars.as_str();
        let number = if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            digits.parse::<u32>().ok()
        } else {
            None
        };
        match (letter, number) {
            (Some('G'), Some(0)) => Command::LinearMove { rapid: true },
            (Some('G'), Some(1)) => Command::LinearMove { rapid: false },
            (Some('G'), Some(4)) | (Some('M'), Some(0)) | (Some('M'), Some(1)) => Command::Dwell,
            (Some('G'), Some(20)) => Command::UnitsInches,
            (Some('G'), Some(21)) => Command::UnitsMillimeters,
            (Some('G'), Some(90)) => Command::AbsolutePositioning,
            (Some('G'), Some(91)) => Command::RelativePositioning,
            (Some('G'), Some(92)) => Command::SetPosition,
            (Some('M'), Some(82)) => Command::AbsoluteExtrusion,
            (Some('M'), Some(83)) => Command::RelativeExtrusion,
            _ => Command::Unrecognized(upper),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Command::Unrecognized(_))
    }
}

/// `<letter><number>` parameter, letter upper-cased.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub letter: char,
    pub value: f64,
}

/// A parsed, non-empty line.
#[derive(Debug, Clone, PartialEq)]
pub struct GCodeLine {
    pub command: Command,
    pub words: Vec<Word>,
}

impl GCodeLine {
    /// First word with the given (upper-case) letter.
    pub fn word(&self, letter: char) -> Option<&Word> {
        self.words.iter().find(|w| w.letter == letter)
    }
}

/// Everything before the first `;`.
pub fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Parse one source line. `line_number` is only used for error reporting.
/// Returns `Ok(None)` for blank and comment-only lines.
pub fn parse_line(line_number: usize, raw: &str) -> Result<Option<GCodeLine>, GCodeError> {
    let code = strip_comment(raw);
    let mut tokens = tokens_with_spans(code);
    let Some((mnemonic, _)) = tokens.next() else {
        return Ok(None);
    };
    let command = Command::from_mnemonic(mnemonic);
    if !command.is_recognized() {
        return Ok(Some(GCodeLine { command, words: Vec::new() }));
    }
    let words = tokens
        .map(|(token, span)| parse_word(line_number, token, span))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(GCodeLine { command, words }))
}

/// Parse a parameter token. The whole remainder after the letter must be a
/// finite number.
pub fn parse_word(line_number: usize, token: &str, span: GCodeSpan) -> Result<Word, GCodeError> {
    let malformed = |reason: &str| GCodeError::MalformedWord {
        line: line_number,
        column: span.range.start + 1,
        token: token.to_string(),
        reason: reason.to_string(),
    };
    let mut chars = token.chars();
    let letter = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
        _ => return Err(malformed("expected an axis letter")),
    };
    let rest = chars.as_str();
    if rest.is_empty() {
        return Err(malformed("missing value"));
    }
    let value: f64 = rest.parse().map_err(|e: std::num::ParseFloatError| malformed(&e.to_string()))?;
    if !value.is_finite() {
        return Err(malformed("value is not finite"));
    }
    Ok(Word { letter, value })
}

fn tokens_with_spans(code: &str) -> impl Iterator<Item = (&str, GCodeSpan)> {
    code.split_whitespace().map(move |token| {
        let start = token.as_ptr() as usize - code.as_ptr() as usize;
        (token, GCodeSpan { range: start..start + token.len() })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_parsing() {
        let line = parse_line(1, "G1 X10.0 y-20.5 F1500").unwrap().unwrap();
        assert_eq!(line.command, Command::LinearMove { rapid: false });
        assert_eq!(line.words.len(), 3);
        assert_eq!(line.words[0].letter, 'X');
        assert_eq!(line.words[0].value, 10.0);
        assert_eq!(line.words[1].letter, 'Y');
        assert_eq!(line.words[1].value, -20.5);
        assert_eq!(line.word('F').map(|w| w.value), Some(1500.0));
    }

    #[test]
    fn test_comment_parsing() {
        assert_eq!(parse_line(1, "; this is a comment").unwrap(), None);
        assert_eq!(parse_line(1, "   ").unwrap(), None);
        assert_eq!(parse_line(1, "").unwrap(), None);
        let line = parse_line(1, "G92 E0 ; reset extruder").unwrap().unwrap();
        assert_eq!(line.command, Command::SetPosition);
        assert_eq!(line.words.len(), 1);
    }

    #[test]
    fn test_mnemonic_normalisation() {
        assert_eq!(Command::from_mnemonic("G01"), Command::LinearMove { rapid: false });
        assert_eq!(Command::from_mnemonic("g0"), Command::LinearMove { rapid: true });
        assert_eq!(Command::from_mnemonic("m83"), Command::RelativeExtrusion);
        assert_eq!(Command::from_mnemonic("M1"), Command::Dwell);
        assert_eq!(Command::from_mnemonic("G29.1"), Command::Unrecognized("G29.1".to_string()));
        assert_eq!(Command::from_mnemonic("t0"), Command::Unrecognized("T0".to_string()));
    }

    #[test]
    fn test_unrecognized_arguments_are_not_parsed() {
        let line = parse_line(3, "M117 Printing layer 1").unwrap().unwrap();
        assert_eq!(line.command, Command::Unrecognized("M117".to_string()));
        assert!(line.words.is_empty());
    }

    #[test]
    fn test_error_handling() {
        let err = parse_line(7, "G1 X1O.5").unwrap_err();
        match err {
            GCodeError::MalformedWord { line, column, token, .. } => {
                assert_eq!(line, 7);
                assert_eq!(column, 4);
                assert_eq!(token, "X1O.5");
            }
            other => panic!("Expected malformed word, got {other:?}"),
        }
        assert!(matches!(
            parse_line(2, "G1 X1  Yabc"),
            Err(GCodeError::MalformedWord { line: 2, column: 8, .. })
        ));
        assert!(parse_line(1, "G1 X").is_err());
        assert!(parse_line(1, "G1 10").is_err());
        assert!(parse_line(1, "G1 Xnan").is_err());
    }

    #[test]
    fn test_whole_token_is_parsed() {
        // Long values are not truncated to a fixed width.
        let line = parse_line(1, "G1 X123.456789012").unwrap().unwrap();
        assert_eq!(line.words[0].value, 123.456789012);
    }
}
