//! STAR/CIF syntax layer: a whole-text tokenizer and the data block it assembles.
//!
//! The tokenizer understands `data_` headers, `loop_`, tags, bare values, single and double
//! quoted strings (a closing quote only counts when followed by whitespace), semicolon text
//! fields and `#` comments. Tokens carry their line number so later stages can report
//! errors precisely. [`DataBlock`] then groups the tokens into tables, one per category,
//! regardless of whether the category was written as a loop or as key/value pairs.

use crate::io::error::Error;

const FORMAT: &str = "mmCIF";

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    DataBlock(String),
    Loop,
    Tag(String),
    Value(String),
    /// Unquoted `.` (inapplicable) or `?` (unknown).
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

/// Splits CIF text into tokens.
///
/// # Errors
///
/// Returns [`Error::Parse`] for unterminated quoted strings and text fields.
pub fn tokenize(text: &str) -> Result<Vec<Spanned>, Error> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1;

    while pos < bytes.len() {
        let b = bytes[pos];

        if b == b'\n' {
            line += 1;
            pos += 1;
            continue;
        }
        if b.is_ascii_whitespace() {
            pos += 1;
            continue;
        }
        if b == b'#' {
            while pos < bytes.len() && bytes[pos] != b'\n' {
                pos += 1;
            }
            continue;
        }

        let at_line_start = pos == 0 || bytes[pos - 1] == b'\n';

        if b == b';' && at_line_start {
            let start_line = line;
            let body = &text[pos + 1..];
            let end = body.find("\n;").ok_or_else(|| {
                Error::parse(FORMAT, None, start_line, "Unterminated text field")
            })?;
            let content = &body[..end];
            line += content.matches('\n').count() + 1;
            tokens.push(Spanned {
                token: Token::Value(content.trim().to_string()),
                line: start_line,
            });
            pos += 1 + end + 2;
            continue;
        }

        if b == b'\'' || b == b'"' {
            let mut end = pos + 1;
            loop {
                match bytes.get(end) {
                    None | Some(b'\n') => {
                        return Err(Error::parse(
                            FORMAT,
                            None,
                            line,
                            "Unterminated quoted string",
                        ));
                    }
                    Some(&c)
                        if c == b
                            && bytes
                                .get(end + 1)
                                .is_none_or(|next| next.is_ascii_whitespace()) =>
                    {
                        break;
                    }
                    Some(_) => end += 1,
                }
            }
            tokens.push(Spanned {
                token: Token::Value(text[pos + 1..end].to_string()),
                line,
            });
            pos = end + 1;
            continue;
        }

        let start = pos;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let word = &text[start..pos];
        tokens.push(Spanned {
            token: classify_word(word),
            line,
        });
    }

    Ok(tokens)
}

fn classify_word(word: &str) -> Token {
    let lower_prefix = word.get(..5).map(str::to_ascii_lowercase);
    match lower_prefix.as_deref() {
        Some("data_") => return Token::DataBlock(word[5..].to_string()),
        Some("loop_") if word.len() == 5 => return Token::Loop,
        _ => {}
    }

    if word.starts_with('_') {
        Token::Tag(word.to_string())
    } else if word == "." || word == "?" {
        Token::Missing
    } else {
        Token::Value(word.to_string())
    }
}

/// One value of a table; `None` for `.` and `?`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: Option<String>,
    pub line: usize,
}

impl Cell {
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Rows of a single category (`_atom_site`, `_cell`, ...).
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub category: String,
    /// Item names without the category prefix (`Cartn_x`).
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Line on which the category begins.
    pub line: usize,
}

impl Table {
    /// Column position of an item, matched case-insensitively.
    pub fn column(&self, item: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(item))
    }

    /// Value of an item in the first row; the natural accessor for key/value categories.
    pub fn first(&self, item: &str) -> Option<&str> {
        let idx = self.column(item)?;
        self.rows.first()?.get(idx)?.as_str()
    }
}

/// The contents of one `data_` block.
#[derive(Debug, Clone, Default)]
pub struct DataBlock {
    pub name: String,
    tables: Vec<Table>,
}

impl DataBlock {
    /// Assembles the first data block from a token stream. Later blocks are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when a tag has no value, a value has no tag, or a loop's
    /// value count is not a multiple of its column count.
    pub fn from_tokens(tokens: Vec<Spanned>) -> Result<Self, Error> {
        let mut block = DataBlock::default();
        let mut seen_block = false;
        let mut iter = tokens.into_iter().peekable();

        while let Some(Spanned { token, line }) = iter.next() {
            match token {
                Token::DataBlock(name) => {
                    if seen_block {
                        log::debug!("Ignoring data block '{}' at line {}", name, line);
                        break;
                    }
                    seen_block = true;
                    block.name = name;
                }
                Token::Tag(tag) => {
                    let value = match iter.next() {
                        Some(Spanned {
                            token: Token::Value(v),
                            line,
                        }) => Cell {
                            value: Some(v),
                            line,
                        },
                        Some(Spanned {
                            token: Token::Missing,
                            line,
                        }) => Cell { value: None, line },
                        _ => {
                            return Err(Error::parse(
                                FORMAT,
                                None,
                                line,
                                format!("Tag {} has no value", tag),
                            ));
                        }
                    };
                    block.push_scalar(&tag, value, line);
                }
                Token::Loop => {
                    let mut tags = Vec::new();
                    while let Some(Spanned {
                        token: Token::Tag(_),
                        ..
                    }) = iter.peek()
                    {
                        if let Some(Spanned {
                            token: Token::Tag(tag),
                            ..
                        }) = iter.next()
                        {
                            tags.push(tag);
                        }
                    }
                    if tags.is_empty() {
                        return Err(Error::parse(FORMAT, None, line, "loop_ without tags"));
                    }

                    let mut cells = Vec::new();
                    while let Some(Spanned {
                        token: Token::Value(_) | Token::Missing,
                        ..
                    }) = iter.peek()
                    {
                        if let Some(Spanned { token, line }) = iter.next() {
                            let value = match token {
                                Token::Value(v) => Some(v),
                                _ => None,
                            };
                            cells.push(Cell { value, line });
                        }
                    }

                    if cells.len() % tags.len() != 0 {
                        return Err(Error::parse(
                            FORMAT,
                            None,
                            line,
                            format!(
                                "loop_ has {} values for {} columns",
                                cells.len(),
                                tags.len()
                            ),
                        ));
                    }

                    block.push_loop(&tags, cells, line);
                }
                Token::Value(_) | Token::Missing => {
                    return Err(Error::parse(
                        FORMAT,
                        None,
                        line,
                        "Value without a preceding tag",
                    ));
                }
            }
        }

        Ok(block)
    }

    pub fn table(&self, category: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.category.eq_ignore_ascii_case(category))
    }

    /// Scalar lookup by full tag, e.g. `_entry.id`.
    pub fn value(&self, tag: &str) -> Option<&str> {
        let (category, item) = split_tag(tag);
        self.table(category)?.first(item)
    }

    fn push_scalar(&mut self, tag: &str, value: Cell, line: usize) {
        let (category, item) = split_tag(tag);
        let idx = match self
            .tables
            .iter()
            .position(|t| t.category.eq_ignore_ascii_case(category) && t.rows.len() == 1)
        {
            Some(idx) => idx,
            None => {
                self.tables.push(Table {
                    category: category.to_string(),
                    columns: Vec::new(),
                    rows: vec![Vec::new()],
                    line,
                });
                self.tables.len() - 1
            }
        };
        let table = &mut self.tables[idx];
        table.columns.push(item.to_string());
        table.rows[0].push(value);
    }

    fn push_loop(&mut self, tags: &[String], cells: Vec<Cell>, line: usize) {
        let (category, _) = split_tag(&tags[0]);
        let columns: Vec<String> = tags
            .iter()
            .map(|t| split_tag(t).1.to_string())
            .collect();

        let width = columns.len();
        let mut rows = Vec::with_capacity(cells.len() / width);
        let mut row = Vec::with_capacity(width);
        for cell in cells {
            row.push(cell);
            if row.len() == width {
                rows.push(std::mem::replace(&mut row, Vec::with_capacity(width)));
            }
        }

        self.tables.push(Table {
            category: category.to_string(),
            columns,
            rows,
            line,
        });
    }
}

/// Splits `_category.item` into its halves; tags without a dot form their own category.
fn split_tag(tag: &str) -> (&str, &str) {
    match tag.split_once('.') {
        Some((category, item)) => (category, item),
        None => (tag, ""),
    }
}

/// Parses CIF text into its first data block.
pub fn parse(text: &str) -> Result<DataBlock, Error> {
    DataBlock::from_tokens(tokenize(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_kinds(text: &str) -> Vec<Token> {
        tokenize(text)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn tokenize_handles_quotes_and_comments() {
        let tokens = token_kinds("data_1ABC # comment\n_struct.title 'It''s \"fine\"' . ?\n");

        assert_eq!(
            tokens,
            vec![
                Token::DataBlock("1ABC".into()),
                Token::Tag("_struct.title".into()),
                Token::Value("It''s \"fine\"".into()),
                Token::Missing,
                Token::Missing,
            ]
        );
    }

    #[test]
    fn tokenize_keeps_embedded_quote_when_not_followed_by_whitespace() {
        let tokens = token_kinds("_atom_site.label_atom_id \"O5'\" 'N1'A'\n");

        assert_eq!(tokens[1], Token::Value("O5'".into()));
        assert_eq!(tokens[2], Token::Value("N1'A".into()));
    }

    #[test]
    fn tokenize_reads_semicolon_text_fields() {
        let text = "_struct.title\n;\nA MULTI-LINE\nTITLE\n;\n_entry.id 1ABC\n";
        let tokens = tokenize(text).unwrap();

        assert_eq!(tokens[1].token, Token::Value("A MULTI-LINE\nTITLE".into()));
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].token, Token::Tag("_entry.id".into()));
        assert_eq!(tokens[2].line, 6);
    }

    #[test]
    fn tokenize_treats_inline_semicolon_as_bare_value() {
        let tokens = token_kinds("_a.b x;y\n");

        assert_eq!(tokens[1], Token::Value("x;y".into()));
    }

    #[test]
    fn tokenize_rejects_unterminated_strings() {
        let err = tokenize("_a.b 'open\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line_number: 1, .. }));

        let err = tokenize("_a.b\n;never closed\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line_number: 2, .. }));
    }

    #[test]
    fn data_block_groups_scalars_and_loops() {
        let block = parse(
            "data_TEST\n_cell.length_a 10.0\n_cell.length_b 20.0\nloop_\n_atom_site.id\n_atom_site.type_symbol\n1 C\n2 N\n",
        )
        .unwrap();

        assert_eq!(block.name, "TEST");
        assert_eq!(block.value("_cell.length_b"), Some("20.0"));

        let atoms = block.table("_atom_site").unwrap();
        assert_eq!(atoms.rows.len(), 2);
        assert_eq!(atoms.column("TYPE_SYMBOL"), Some(1));
        assert_eq!(atoms.rows[1][1].as_str(), Some("N"));
        assert_eq!(atoms.line, 4);
    }

    #[test]
    fn data_block_rejects_ragged_loops() {
        let err = parse("loop_\n_a.x\n_a.y\n1 2 3\n").unwrap_err();

        assert!(matches!(err, Error::Parse { line_number: 1, .. }));
    }

    #[test]
    fn data_block_rejects_tag_without_value() {
        let err = parse("_entry.id\n_struct.title x\n").unwrap_err();

        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn data_block_reads_only_first_block() {
        let block = parse("data_A\n_entry.id A\ndata_B\n_entry.id B\n").unwrap();

        assert_eq!(block.value("_entry.id"), Some("A"));
    }
}
