//! Parser-level diagnostic codes and the `Diagnostic` construction helper
//! shared by the parser and the validator.

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, DiagnosticTag, NumberOrString, Range};

use crate::line_index::LineIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorCode {
    InvalidSymbol,
    InvalidNumberFormat,
    PropertyNameExpected,
    ValueExpected,
    ColonExpected,
    CommaExpected,
    CloseBraceExpected,
    CloseBracketExpected,
    EndOfFileExpected,
    InvalidCommentToken,
    UnexpectedEndOfComment,
    UnexpectedEndOfString,
    UnexpectedEndOfNumber,
    InvalidUnicode,
    InvalidEscapeCharacter,
    InvalidCharacter,
    TrailingComma,
    DuplicateKey,
}

impl ParseErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseErrorCode::InvalidSymbol => "InvalidSymbol",
            ParseErrorCode::InvalidNumberFormat => "InvalidNumberFormat",
            ParseErrorCode::PropertyNameExpected => "PropertyNameExpected",
            ParseErrorCode::ValueExpected => "ValueExpected",
            ParseErrorCode::ColonExpected => "ColonExpected",
            ParseErrorCode::CommaExpected => "CommaExpected",
            ParseErrorCode::CloseBraceExpected => "CloseBraceExpected",
            ParseErrorCode::CloseBracketExpected => "CloseBracketExpected",
            ParseErrorCode::EndOfFileExpected => "EndOfFileExpected",
            ParseErrorCode::InvalidCommentToken => "InvalidCommentToken",
            ParseErrorCode::UnexpectedEndOfComment => "UnexpectedEndOfComment",
            ParseErrorCode::UnexpectedEndOfString => "UnexpectedEndOfString",
            ParseErrorCode::UnexpectedEndOfNumber => "UnexpectedEndOfNumber",
            ParseErrorCode::InvalidUnicode => "InvalidUnicode",
            ParseErrorCode::InvalidEscapeCharacter => "InvalidEscapeCharacter",
            ParseErrorCode::InvalidCharacter => "InvalidCharacter",
            ParseErrorCode::TrailingComma => "TrailingComma",
            ParseErrorCode::DuplicateKey => "DuplicateKey",
        }
    }
}

/// Code carried by validator-produced problems (as opposed to parser errors).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemCode {
    EnumValueMismatch,
}

impl ProblemCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemCode::EnumValueMismatch => "EnumValueMismatch",
        }
    }
}

pub fn make_diagnostic(
    line_index: &LineIndex,
    text: &str,
    offset: usize,
    length: usize,
    message: String,
    severity: DiagnosticSeverity,
    code: Option<&'static str>,
) -> Diagnostic {
    let range = tower_lsp::lsp_types::Range {
        start: line_index.position_at(text, offset),
        end: line_index.position_at(text, offset + length),
    };
    Diagnostic {
        range,
        severity: Some(severity),
        code: code.map(|c| NumberOrString::String(c.to_string())),
        source: Some("json".to_string()),
        message,
        ..Default::default()
    }
}

/// Builds a diagnostic from an already-resolved range, for callers (the
/// validator) that derive positions from a [`JSONDocument`] rather than
/// scanning source text directly.
pub fn diagnostic_for_range(
    range: Range,
    message: String,
    severity: DiagnosticSeverity,
    code: Option<&'static str>,
) -> Diagnostic {
    Diagnostic {
        range,
        severity: Some(severity),
        code: code.map(|c| NumberOrString::String(c.to_string())),
        source: Some("json".to_string()),
        message,
        ..Default::default()
    }
}

pub fn deprecation_diagnostic_for_range(range: Range, message: String) -> Diagnostic {
    Diagnostic {
        range,
        severity: Some(DiagnosticSeverity::HINT),
        tags: Some(vec![DiagnosticTag::DEPRECATED]),
        source: Some("json".to_string()),
        message,
        ..Default::default()
    }
}

pub fn make_deprecation_diagnostic(
    line_index: &LineIndex,
    text: &str,
    offset: usize,
    length: usize,
    message: String,
) -> Diagnostic {
    let range = tower_lsp::lsp_types::Range {
        start: line_index.position_at(text, offset),
        end: line_index.position_at(text, offset + length),
    };
    Diagnostic {
        range,
        severity: Some(DiagnosticSeverity::HINT),
        tags: Some(vec![DiagnosticTag::DEPRECATED]),
        source: Some("json".to_string()),
        message,
        ..Default::default()
    }
}
