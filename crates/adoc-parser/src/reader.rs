//! Line cursor over the expanded source.

use std::path::Path;
use std::sync::Arc;

use crate::error::ParseError;

/// One source line after include expansion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Line {
    pub text: String,
    /// 1-based line number within `file`.
    pub number: usize,
    /// Included file the line comes from; `None` for the root source.
    pub file: Option<Arc<Path>>,
    /// Section level offset from `leveloffset` include options.
    pub level_offset: i32,
}

impl Line {
    pub fn root(number: usize, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            number,
            file: None,
            level_offset: 0,
        }
    }

    pub fn syntax_error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Syntax {
            line: self.number,
            file: self.file.as_deref().map(Path::to_path_buf),
            message: message.into(),
        }
    }
}

/// Cursor over lines. All position state lives here and is local to one parse.
#[derive(Debug)]
pub(crate) struct Reader {
    lines: Vec<Line>,
    pos: usize,
}

impl Reader {
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines, pos: 0 }
    }

    /// Reader over plain text, numbering lines from `first_number`.
    pub fn from_text(text: &str, first_number: usize) -> Self {
        Self::new(
            text.lines()
                .enumerate()
                .map(|(i, line)| Line::root(first_number + i, line))
                .collect(),
        )
    }

    pub fn peek(&self) -> Option<&Line> {
        self.lines.get(self.pos)
    }

    pub fn peek_text(&self) -> Option<&str> {
        self.peek().map(|line| line.text.as_str())
    }

    /// Line `offset` positions ahead of the cursor.
    pub fn peek_at(&self, offset: usize) -> Option<&Line> {
        self.lines.get(self.pos + offset)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Line> {
        let line = self.lines.get(self.pos).cloned();
        if line.is_some() {
            self.pos += 1;
        }
        line
    }

    pub fn skip(&mut self) {
        if self.pos < self.lines.len() {
            self.pos += 1;
        }
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.lines.len()
    }

    /// Last consumed line, used to report errors at end of input.
    pub fn last(&self) -> Option<&Line> {
        self.pos.checked_sub(1).and_then(|i| self.lines.get(i))
    }

    pub fn skip_blank_lines(&mut self) {
        while self.peek_text().is_some_and(|t| t.trim().is_empty()) {
            self.pos += 1;
        }
    }

    /// Skip blank lines, `//` line comments and `////` comment blocks.
    pub fn skip_blank_lines_and_comments(&mut self) -> Result<(), ParseError> {
        loop {
            self.skip_blank_lines();
            let Some(line) = self.peek() else {
                return Ok(());
            };
            if is_comment_block_delimiter(&line.text) {
                let Some(opening) = self.next() else {
                    return Ok(());
                };
                let delimiter = opening.text.trim_end().to_owned();
                loop {
                    match self.next() {
                        Some(l) if l.text.trim_end() == delimiter => break,
                        Some(_) => {}
                        None => return Err(opening.syntax_error("unterminated comment block")),
                    }
                }
            } else if is_line_comment(&line.text) {
                self.pos += 1;
            } else {
                return Ok(());
            }
        }
    }

    /// Consume lines until one equals `delimiter`, which is consumed too.
    ///
    /// Fails with the position of `opening` if the input ends first.
    pub fn read_until_delimiter(
        &mut self,
        opening: &Line,
        delimiter: &str,
        block: &str,
    ) -> Result<Vec<Line>, ParseError> {
        let mut content = Vec::new();
        loop {
            match self.next() {
                Some(line) if line.text.trim_end() == delimiter => return Ok(content),
                Some(line) => content.push(line),
                None => {
                    return Err(opening.syntax_error(format!("unterminated {block} block")));
                }
            }
        }
    }
}

pub(crate) fn is_comment_block_delimiter(text: &str) -> bool {
    let trimmed = text.trim_end();
    trimmed.len() >= 4 && trimmed.bytes().all(|b| b == b'/')
}

pub(crate) fn is_line_comment(text: &str) -> bool {
    text.starts_with("//") && !text.starts_with("///")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_peek_and_next() {
        let mut reader = Reader::from_text("a\nb", 1);
        assert_eq!(reader.peek_text(), Some("a"));
        assert_eq!(reader.peek_at(1).map(|l| l.number), Some(2));
        assert_eq!(reader.next().map(|l| l.text), Some("a".to_owned()));
        assert_eq!(reader.next().map(|l| l.text), Some("b".to_owned()));
        assert!(reader.is_eof());
        assert_eq!(reader.last().map(|l| l.number), Some(2));
    }

    #[test]
    fn test_skip_comments() {
        let mut reader = Reader::from_text("// note\n\n////\nhidden\n////\ntext", 1);
        reader.skip_blank_lines_and_comments().unwrap();
        assert_eq!(reader.peek_text(), Some("text"));
    }

    #[test]
    fn test_unterminated_comment_block() {
        let mut reader = Reader::from_text("text\n////\nhidden", 1);
        reader.skip();
        let error = reader.skip_blank_lines_and_comments().unwrap_err();
        assert_eq!(error.kind(), ParseErrorKind::Syntax);
        assert_eq!(error.line(), 2);
    }

    #[test]
    fn test_read_until_delimiter() {
        let mut reader = Reader::from_text("----\ncode\n----\nafter", 1);
        let opening = reader.next().unwrap();
        let content = reader
            .read_until_delimiter(&opening, "----", "listing")
            .unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(reader.peek_text(), Some("after"));
    }

    #[test]
    fn test_read_until_delimiter_unterminated() {
        let mut reader = Reader::from_text("----\ncode", 1);
        let opening = reader.next().unwrap();
        let error = reader
            .read_until_delimiter(&opening, "----", "listing")
            .unwrap_err();
        assert_eq!(error.line(), 1);
        assert!(error.to_string().contains("unterminated listing block"));
    }

    #[test]
    fn test_triple_slash_is_not_comment() {
        assert!(!is_line_comment("/// doc"));
        assert!(is_line_comment("// note"));
        assert!(is_comment_block_delimiter("//////"));
    }
}
