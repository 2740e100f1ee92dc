//! Recursive-descent parser building a [`JSONDocument`] directly from source
//! text. Errors don't abort parsing: each production knows how to recover
//! and keep producing a tree, so a document with mistakes still yields the
//! most complete AST it can.

use std::collections::HashMap;

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity};

use crate::ast::{JSONDocument, Node, NodeData, NodeId};
use crate::diagnostic::{make_diagnostic, ParseErrorCode};
use crate::line_index::LineIndex;
use crate::scanner::{ScanError, Scanner, TokenKind};

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub collect_comments: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            collect_comments: false,
        }
    }
}

pub fn parse(text: &str, options: ParseOptions) -> JSONDocument {
    let mut parser = Parser::new(text, options);
    parser.advance();
    let root = parser.parse_value();
    if parser.token != TokenKind::Eof {
        parser.error(ParseErrorCode::EndOfFileExpected, &[], &[]);
    }
    JSONDocument::new(
        text.to_string(),
        parser.arena,
        root,
        parser.errors,
        parser.comments,
    )
}

struct Parser<'a> {
    text: &'a str,
    scanner: Scanner<'a>,
    options: ParseOptions,
    arena: Vec<Node>,
    errors: Vec<Diagnostic>,
    comments: Vec<(usize, usize)>,
    line_index: LineIndex,
    token: TokenKind,
    token_offset: usize,
    token_length: usize,
    token_value: String,
    last_error_offset: Option<usize>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, options: ParseOptions) -> Self {
        Self {
            text,
            scanner: Scanner::new(text),
            options,
            arena: Vec::new(),
            errors: Vec::new(),
            comments: Vec::new(),
            line_index: LineIndex::new(text),
            token: TokenKind::Eof,
            token_offset: 0,
            token_length: 0,
            token_value: String::new(),
            last_error_offset: None,
        }
    }

    /// Advances to the next meaningful token, swallowing trivia, line breaks
    /// and comments along the way (comments are recorded when requested).
    fn advance(&mut self) {
        loop {
            let kind = self.scanner.scan();
            match kind {
                TokenKind::Trivia | TokenKind::LineBreak => continue,
                TokenKind::LineComment | TokenKind::BlockComment => {
                    if self.options.collect_comments {
                        self.comments
                            .push((self.scanner.token_offset, self.scanner.token_length));
                    }
                    if self.scanner.token_error == ScanError::UnexpectedEndOfComment {
                        self.push_diag(
                            ParseErrorCode::UnexpectedEndOfComment,
                            self.scanner.token_offset,
                            self.scanner.token_length.max(1),
                        );
                    }
                    continue;
                }
                TokenKind::Unknown
                    if self.scanner.token_length == 1
                        && &self.text
                            [self.scanner.token_offset..self.scanner.token_offset + 1]
                            == "/" =>
                {
                    self.push_diag(ParseErrorCode::InvalidCommentToken, self.scanner.token_offset, 1);
                    continue;
                }
                _ => {
                    self.token = kind;
                    self.token_offset = self.scanner.token_offset;
                    self.token_length = self.scanner.token_length;
                    self.token_value = self.scanner.token_value.clone();
                    if let Some(code) = scan_error_code(kind, self.scanner.token_error) {
                        self.push_diag(code, self.token_offset, self.token_length.max(1));
                    }
                    break;
                }
            }
        }
    }

    fn push_diag(&mut self, code: ParseErrorCode, offset: usize, length: usize) {
        if self.last_error_offset == Some(offset) {
            return;
        }
        self.last_error_offset = Some(offset);
        let diagnostic = make_diagnostic(
            &self.line_index,
            self.text,
            offset,
            length.max(1),
            message_for(code),
            default_severity(code),
            Some(code.as_str()),
        );
        self.errors.push(diagnostic);
    }

    /// Reports `code` at the current token and, if recovery sets are given,
    /// skips tokens until one of them is reached. `skip_until_after` consumes
    /// the matching token too; `skip_until` leaves it for the caller.
    fn error(&mut self, code: ParseErrorCode, skip_until_after: &[TokenKind], skip_until: &[TokenKind]) {
        let length = if self.token == TokenKind::Eof {
            0
        } else {
            self.token_length.max(1)
        };
        self.push_diag(code, self.token_offset, length);
        if skip_until_after.is_empty() && skip_until.is_empty() {
            return;
        }
        while self.token != TokenKind::Eof {
            if skip_until_after.contains(&self.token) {
                self.advance();
                return;
            }
            if skip_until.contains(&self.token) {
                return;
            }
            self.advance();
        }
    }

    fn push_node(&mut self, offset: usize, length: usize, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = self.arena.len();
        self.arena.push(Node {
            offset,
            length,
            parent,
            data,
        });
        id
    }

    fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        self.arena[child].parent = Some(parent);
    }

    fn finish_container(&mut self, id: NodeId, start: usize, end: usize) {
        self.arena[id].length = end.saturating_sub(start);
    }

    fn parse_value(&mut self) -> Option<NodeId> {
        match self.token {
            TokenKind::OpenBrace => self.parse_object(),
            TokenKind::OpenBracket => self.parse_array(),
            TokenKind::String => self.parse_string_literal(),
            TokenKind::Number => self.parse_number_literal(),
            TokenKind::True => Some(self.parse_literal(NodeData::Boolean(true))),
            TokenKind::False => Some(self.parse_literal(NodeData::Boolean(false))),
            TokenKind::Null => Some(self.parse_literal(NodeData::Null)),
            _ => {
                self.error(
                    ParseErrorCode::ValueExpected,
                    &[],
                    &[TokenKind::CloseBrace, TokenKind::CloseBracket, TokenKind::Comma],
                );
                None
            }
        }
    }

    fn parse_literal(&mut self, data: NodeData) -> NodeId {
        let id = self.push_node(self.token_offset, self.token_length, None, data);
        self.advance();
        id
    }

    fn parse_string_literal(&mut self) -> Option<NodeId> {
        let id = self.push_node(
            self.token_offset,
            self.token_length,
            None,
            NodeData::String(self.token_value.clone()),
        );
        self.advance();
        Some(id)
    }

    fn parse_number_literal(&mut self) -> Option<NodeId> {
        let raw = self.token_value.clone();
        let value: f64 = raw.parse().unwrap_or(0.0);
        let is_integer = !raw.bytes().any(|b| matches!(b, b'.' | b'e' | b'E'));
        let id = self.push_node(
            self.token_offset,
            self.token_length,
            None,
            NodeData::Number {
                value,
                is_integer,
                raw,
            },
        );
        self.advance();
        Some(id)
    }

    fn parse_array(&mut self) -> Option<NodeId> {
        let offset = self.token_offset;
        let arr_id = self.push_node(offset, 0, None, NodeData::Array(Vec::new()));
        self.advance(); // consume '['
        let mut needs_comma = false;
        while !matches!(self.token, TokenKind::CloseBracket | TokenKind::Eof) {
            if needs_comma {
                if self.token == TokenKind::Comma {
                    self.advance();
                    if self.token == TokenKind::CloseBracket {
                        self.push_diag(ParseErrorCode::TrailingComma, self.token_offset, self.token_length.max(1));
                        break;
                    }
                } else {
                    self.error(ParseErrorCode::CommaExpected, &[], &[]);
                }
            }
            if matches!(self.token, TokenKind::CloseBracket | TokenKind::Eof) {
                break;
            }
            match self.parse_value() {
                Some(item_id) => self.add_array_child(arr_id, item_id),
                None => {
                    if !matches!(self.token, TokenKind::Comma | TokenKind::CloseBracket | TokenKind::Eof) {
                        self.advance();
                    }
                }
            }
            needs_comma = true;
        }
        if self.token == TokenKind::Eof {
            self.push_diag(ParseErrorCode::CloseBracketExpected, self.token_offset, 0);
        }
        let end_offset = self.token_offset;
        let end_length = if self.token == TokenKind::CloseBracket {
            self.token_length
        } else {
            0
        };
        if self.token == TokenKind::CloseBracket {
            self.advance();
        }
        self.finish_container(arr_id, offset, end_offset + end_length);
        Some(arr_id)
    }

    fn add_array_child(&mut self, parent: NodeId, child: NodeId) {
        if let NodeData::Array(children) = &mut self.arena[parent].data {
            children.push(child);
        }
        self.set_parent(child, parent);
    }

    fn parse_object(&mut self) -> Option<NodeId> {
        let offset = self.token_offset;
        let obj_id = self.push_node(offset, 0, None, NodeData::Object(Vec::new()));
        self.advance(); // consume '{'
        let mut seen_keys: HashMap<String, SeenKey> = HashMap::new();
        let mut needs_comma = false;
        while !matches!(self.token, TokenKind::CloseBrace | TokenKind::Eof) {
            if needs_comma {
                if self.token == TokenKind::Comma {
                    self.advance();
                    if self.token == TokenKind::CloseBrace {
                        self.push_diag(ParseErrorCode::TrailingComma, self.token_offset, self.token_length.max(1));
                        break;
                    }
                } else {
                    self.error(ParseErrorCode::CommaExpected, &[], &[]);
                }
            }
            if matches!(self.token, TokenKind::CloseBrace | TokenKind::Eof) {
                break;
            }
            let prop_id = self.parse_property();
            self.check_duplicate_key(prop_id, &mut seen_keys);
            self.add_object_child(obj_id, prop_id);
            needs_comma = true;
        }
        if self.token == TokenKind::Eof {
            self.push_diag(ParseErrorCode::CloseBraceExpected, self.token_offset, 0);
        }
        let end_offset = self.token_offset;
        let end_length = if self.token == TokenKind::CloseBrace {
            self.token_length
        } else {
            0
        };
        if self.token == TokenKind::CloseBrace {
            self.advance();
        }
        self.finish_container(obj_id, offset, end_offset + end_length);
        Some(obj_id)
    }

    fn add_object_child(&mut self, parent: NodeId, child: NodeId) {
        if let NodeData::Object(children) = &mut self.arena[parent].data {
            children.push(child);
        }
        self.set_parent(child, parent);
    }

    /// Property name followed by `: value`. Recovers from an unquoted key
    /// (treats the bare identifier as the key, flagged) and from a missing
    /// colon or value, always producing a `Property` node.
    fn parse_property(&mut self) -> NodeId {
        let prop_offset = self.token_offset;
        let key_id = match self.token {
            TokenKind::String => self
                .parse_string_literal()
                .expect("a string token always yields a node"),
            TokenKind::Unknown => {
                let offset = self.token_offset;
                let length = self.token_length;
                let value = self.token_value.clone();
                self.push_diag(ParseErrorCode::PropertyNameExpected, offset, length.max(1));
                let id = self.push_node(offset, length, None, NodeData::String(value));
                self.advance();
                id
            }
            _ => {
                self.push_diag(ParseErrorCode::PropertyNameExpected, self.token_offset, self.token_length.max(1));
                self.push_node(self.token_offset, 0, None, NodeData::String(String::new()))
            }
        };

        let mut colon_offset: i64 = -1;
        let mut value_id = None;
        if self.token == TokenKind::Colon {
            colon_offset = self.token_offset as i64;
            self.advance();
            value_id = if matches!(self.token, TokenKind::CloseBrace | TokenKind::Comma | TokenKind::Eof) {
                None
            } else {
                self.parse_value()
            };
        } else {
            self.push_diag(ParseErrorCode::ColonExpected, self.token_offset, self.token_length.max(1));
            // No colon: if the current token looks like the *next*
            // property's key (a string literal on a later line than this
            // property's key), stop here with no value rather than
            // swallowing that key as this property's value. Otherwise try
            // parsing the current token as the value directly.
            let key_line = self.line_index.position_at(self.text, self.arena[key_id].offset).line;
            let current_line = self.line_index.position_at(self.text, self.token_offset).line;
            let next_key_on_later_line = self.token == TokenKind::String && current_line > key_line;
            if !next_key_on_later_line && !matches!(self.token, TokenKind::CloseBrace | TokenKind::Comma | TokenKind::Eof) {
                value_id = self.parse_value();
            }
        }

        let key_end = self.arena[key_id].end();
        let end = if let Some(v) = value_id {
            self.arena[v].end()
        } else if colon_offset >= 0 {
            colon_offset as usize + 1
        } else {
            key_end
        };
        let length = end.saturating_sub(prop_offset);
        let prop_id = self.push_node(
            prop_offset,
            length,
            None,
            NodeData::Property {
                key: key_id,
                value: value_id,
                colon_offset,
            },
        );
        self.set_parent(key_id, prop_id);
        if let Some(v) = value_id {
            self.set_parent(v, prop_id);
        }
        prop_id
    }

    /// Warns on both the first and every subsequent occurrence of a
    /// duplicate key: the first occurrence's warning is emitted
    /// retroactively, the moment a duplicate is seen, and only once.
    fn check_duplicate_key(&mut self, prop_id: NodeId, seen: &mut HashMap<String, SeenKey>) {
        let key_info = if let NodeData::Property { key, .. } = &self.arena[prop_id].data {
            if let NodeData::String(s) = &self.arena[*key].data {
                Some((self.arena[*key].offset, self.arena[*key].length, s.clone()))
            } else {
                None
            }
        } else {
            None
        };
        let Some((offset, length, s)) = key_info else { return };
        if s.is_empty() {
            return;
        }
        if let Some(first) = seen.get_mut(&s) {
            if !first.reported {
                let (first_offset, first_length) = (first.offset, first.length);
                first.reported = true;
                self.push_diag(ParseErrorCode::DuplicateKey, first_offset, first_length.max(1));
            }
            self.push_diag(ParseErrorCode::DuplicateKey, offset, length.max(1));
        } else {
            seen.insert(s, SeenKey { offset, length, reported: false });
        }
    }
}

struct SeenKey {
    offset: usize,
    length: usize,
    reported: bool,
}

fn scan_error_code(kind: TokenKind, err: ScanError) -> Option<ParseErrorCode> {
    match (kind, err) {
        (_, ScanError::None) => None,
        (TokenKind::String, ScanError::UnexpectedEndOfString) => Some(ParseErrorCode::UnexpectedEndOfString),
        (TokenKind::String, ScanError::InvalidEscapeCharacter) => Some(ParseErrorCode::InvalidEscapeCharacter),
        (TokenKind::String, ScanError::InvalidUnicode) => Some(ParseErrorCode::InvalidUnicode),
        (TokenKind::Number, ScanError::UnexpectedEndOfNumber) => Some(ParseErrorCode::UnexpectedEndOfNumber),
        (TokenKind::Unknown, ScanError::InvalidCharacter) => Some(ParseErrorCode::InvalidSymbol),
        _ => None,
    }
}

fn default_severity(code: ParseErrorCode) -> DiagnosticSeverity {
    match code {
        ParseErrorCode::TrailingComma | ParseErrorCode::DuplicateKey => DiagnosticSeverity::WARNING,
        _ => DiagnosticSeverity::ERROR,
    }
}

fn message_for(code: ParseErrorCode) -> String {
    match code {
        ParseErrorCode::InvalidSymbol => "Invalid symbol".to_string(),
        ParseErrorCode::InvalidNumberFormat => "Invalid number format".to_string(),
        ParseErrorCode::PropertyNameExpected => "Property name expected".to_string(),
        ParseErrorCode::ValueExpected => "Value expected".to_string(),
        ParseErrorCode::ColonExpected => "Colon expected".to_string(),
        ParseErrorCode::CommaExpected => "Expected comma".to_string(),
        ParseErrorCode::CloseBraceExpected => "Closing brace expected".to_string(),
        ParseErrorCode::CloseBracketExpected => "Closing bracket expected".to_string(),
        ParseErrorCode::EndOfFileExpected => "End of file expected".to_string(),
        ParseErrorCode::InvalidCommentToken => "Invalid comment token".to_string(),
        ParseErrorCode::UnexpectedEndOfComment => "Unexpected end of comment".to_string(),
        ParseErrorCode::UnexpectedEndOfString => "Unexpected end of string".to_string(),
        ParseErrorCode::UnexpectedEndOfNumber => "Unexpected end of number".to_string(),
        ParseErrorCode::InvalidUnicode => "Invalid unicode sequence in string".to_string(),
        ParseErrorCode::InvalidEscapeCharacter => "Invalid escape character in string".to_string(),
        ParseErrorCode::InvalidCharacter => "Invalid character".to_string(),
        ParseErrorCode::TrailingComma => "Trailing comma".to_string(),
        ParseErrorCode::DuplicateKey => "Duplicate object key".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    fn codes(text: &str) -> Vec<String> {
        let doc = parse(text, ParseOptions::default());
        doc.syntax_errors
            .iter()
            .filter_map(|d| match &d.code {
                Some(tower_lsp::lsp_types::NumberOrString::String(s)) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn parses_nested_object() {
        let doc = parse(r#"{"a": [1, true, null], "b": "x"}"#, ParseOptions::default());
        assert!(doc.syntax_errors.is_empty());
        let root = doc.root.unwrap();
        assert_eq!(doc.node(root).kind(), NodeKind::Object);
        if let NodeData::Object(children) = &doc.node(root).data {
            assert_eq!(children.len(), 2);
        } else {
            panic!("expected object");
        }
    }

    #[test]
    fn flags_duplicate_keys() {
        let doc = parse(r#"{"a": 1, "a": 2}"#, ParseOptions::default());
        let duplicate_key_count = codes(r#"{"a": 1, "a": 2}"#)
            .into_iter()
            .filter(|c| c == "DuplicateKey")
            .count();
        assert_eq!(duplicate_key_count, 2, "both occurrences of a duplicate key should be flagged");
        assert!(doc.root.is_some());
    }

    #[test]
    fn flags_trailing_comma() {
        assert!(codes(r#"[1, 2,]"#).contains(&"TrailingComma".to_string()));
    }

    #[test]
    fn recovers_unquoted_key() {
        let doc = parse(r#"{foo: 1}"#, ParseOptions::default());
        assert!(doc
            .syntax_errors
            .iter()
            .any(|d| d.message == "Property name expected"));
        let root = doc.root.unwrap();
        if let NodeData::Object(children) = &doc.node(root).data {
            let prop = doc.node(children[0]);
            if let NodeData::Property { key, value, .. } = &prop.data {
                assert_eq!(doc.node(*key).as_str(), Some("foo"));
                let value_id = value.expect("value parsed despite unquoted key");
                assert!(matches!(doc.node(value_id).data, NodeData::Number { .. }));
            } else {
                panic!("expected property");
            }
        } else {
            panic!("expected object");
        }
    }

    #[test]
    fn recovers_missing_colon() {
        let doc = parse(r#"{"a" 1}"#, ParseOptions::default());
        assert!(doc.syntax_errors.iter().any(|d| d.message == "Colon expected"));
        let root = doc.root.unwrap();
        if let NodeData::Object(children) = &doc.node(root).data {
            let prop = doc.node(children[0]);
            if let NodeData::Property { value, .. } = &prop.data {
                assert!(value.is_some());
            } else {
                panic!("expected property");
            }
        } else {
            panic!("expected object");
        }
    }

    #[test]
    fn missing_colon_before_next_keys_string_leaves_property_valueless() {
        let doc = parse("{\"a\"\n\"b\": 1}", ParseOptions::default());
        assert!(doc.syntax_errors.iter().any(|d| d.message == "Colon expected"));
        let root = doc.root.unwrap();
        if let NodeData::Object(children) = &doc.node(root).data {
            assert_eq!(children.len(), 2, "the dangling key and \"b\" should both become properties");
            let first = doc.node(children[0]);
            if let NodeData::Property { value, .. } = &first.data {
                assert!(value.is_none(), "a later-line string after a missing colon should not be swallowed as the value");
            } else {
                panic!("expected property");
            }
            let second = doc.node(children[1]);
            if let NodeData::Property { key, .. } = &second.data {
                assert_eq!(doc.node(*key).as_str(), Some("b"));
            } else {
                panic!("expected property");
            }
        } else {
            panic!("expected object");
        }
    }

    #[test]
    fn missing_comma_between_array_values_uses_comma_expected() {
        assert!(codes("[1 2]").contains(&"CommaExpected".to_string()));
    }

    #[test]
    fn missing_comma_between_object_properties_uses_comma_expected() {
        assert!(codes(r#"{"a": 1 "b": 2}"#).contains(&"CommaExpected".to_string()));
    }

    #[test]
    fn flags_unterminated_string() {
        assert!(codes("\"abc").contains(&"UnexpectedEndOfString".to_string()));
    }

    #[test]
    fn trailing_garbage_reported_once() {
        let doc = parse("1 2 3", ParseOptions::default());
        assert_eq!(doc.syntax_errors.len(), 1);
        assert_eq!(doc.syntax_errors[0].message, "End of file expected");
    }

    #[test]
    fn collects_comments_when_requested() {
        let doc = parse("{\n// hi\n}", ParseOptions { collect_comments: true });
        assert_eq!(doc.comments.len(), 1);
    }

    #[test]
    fn empty_object_and_array_round_trip() {
        let doc = parse("{}", ParseOptions::default());
        assert!(doc.syntax_errors.is_empty());
        let doc = parse("[]", ParseOptions::default());
        assert!(doc.syntax_errors.is_empty());
    }
}
