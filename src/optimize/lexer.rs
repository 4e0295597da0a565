//! Segment lexer for source languages.
//!
//! The lexer does not tokenize; it only splits content into runs of code,
//! literals and comments, which is all the transforms need to stay out of
//! strings and know what they may delete.

use super::FallbackReason;

/// What a run of text is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    Code,
    /// String, character, regex or raw markup body.
    Literal,
    Comment { block: bool },
    DocComment { block: bool },
    /// String literal in docstring position.
    Docstring,
    /// Comment that changes program meaning.
    Directive,
    /// Markup tag.
    Tag,
}

impl SegmentKind {
    pub(crate) const fn is_code(self) -> bool {
        matches!(self, Self::Code | Self::Tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment<'a> {
    pub(crate) kind: SegmentKind,
    pub(crate) text: &'a str,
}

/// Heredoc syntax of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Heredoc {
    /// `<<TAG`, `<<-TAG`, `<< 'TAG'`
    Shell,
    /// `<<TAG`, `<<-TAG`, `<<~TAG`
    Ruby,
    /// `<<<TAG`, `<<<'TAG'`, `<<<"TAG"`
    Php,
}

/// Literal body that starts on the line after the construct opening it.
#[derive(Debug, Clone, Copy)]
enum Body<'a> {
    /// `trailing`: code may follow the tag on the terminator line.
    Heredoc {
        tag: &'a str,
        indented: bool,
        trailing: bool,
    },
    /// YAML block scalar: every following line indented past `parent`.
    Indented { parent: usize },
}

/// Lexical rules for one language family.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Syntax {
    pub(crate) line_comments: &'static [&'static str],
    pub(crate) block_comment: Option<(&'static str, &'static str)>,
    pub(crate) nested_block_comments: bool,
    pub(crate) doc_line_prefixes: &'static [&'static str],
    pub(crate) doc_block_prefixes: &'static [&'static str],
    /// Comment prefixes kept at every level.
    pub(crate) directives: &'static [&'static str],
    pub(crate) shebang: bool,
    pub(crate) quotes: &'static [char],
    /// Quotes whose literals may contain raw newlines.
    pub(crate) multiline_quotes: &'static [char],
    pub(crate) triple_quotes: &'static [&'static str],
    /// Letters that may prefix a quote (`r"..."`, `f'...'`).
    pub(crate) string_prefixes: &'static str,
    /// Single-quoted literals without backslash escapes.
    pub(crate) raw_single_quotes: bool,
    /// Raw strings, byte strings and lifetimes.
    pub(crate) rust_literals: bool,
    pub(crate) regex_literals: bool,
    /// `#` only starts a comment at the beginning of a word.
    pub(crate) hash_needs_space: bool,
    /// Quotes only open a literal after whitespace or punctuation.
    pub(crate) quote_needs_boundary: bool,
    /// `//` right after `:` is code (`url(http://...)`).
    pub(crate) url_guard: bool,
    /// `#[` starts an attribute rather than a comment.
    pub(crate) hash_attribute_guard: bool,
    pub(crate) python_docstrings: bool,
    pub(crate) heredocs: Option<Heredoc>,
    /// `key: |` and `key: >` open an indented literal body.
    pub(crate) block_scalars: bool,
}

impl Syntax {
    pub(crate) const PLAIN: Self = Self {
        line_comments: &[],
        block_comment: None,
        nested_block_comments: false,
        doc_line_prefixes: &[],
        doc_block_prefixes: &[],
        directives: &[],
        shebang: false,
        quotes: &[],
        multiline_quotes: &[],
        triple_quotes: &[],
        string_prefixes: "",
        raw_single_quotes: false,
        rust_literals: false,
        regex_literals: false,
        hash_needs_space: false,
        quote_needs_boundary: false,
        url_guard: false,
        hash_attribute_guard: false,
        python_docstrings: false,
        heredocs: None,
        block_scalars: false,
    };
}

/// Splits `src` into segments.
pub(crate) fn lex<'a>(src: &'a str, syntax: &Syntax) -> Result<Vec<Segment<'a>>, FallbackReason> {
    let mut lexer = Lexer {
        src,
        syntax,
        pos: 0,
        code_start: 0,
        line_start: 0,
        comment_at: None,
        pending: Vec::new(),
        segments: Vec::new(),
    };
    lexer.run()?;
    let mut segments = lexer.segments;
    if syntax.python_docstrings {
        mark_python_docstrings(&mut segments);
    }
    Ok(segments)
}

struct Lexer<'a, 's> {
    src: &'a str,
    syntax: &'s Syntax,
    pos: usize,
    code_start: usize,
    line_start: usize,
    /// Start of a line comment on the current line.
    comment_at: Option<usize>,
    /// Bodies that begin after the current line.
    pending: Vec<Body<'a>>,
    segments: Vec<Segment<'a>>,
}

impl<'a> Lexer<'a, '_> {
    fn run(&mut self) -> Result<(), FallbackReason> {
        if self.syntax.shebang && self.src.starts_with("#!") {
            let end = self.line_end(0);
            self.emit(SegmentKind::Directive, end);
        }

        let src = self.src;
        while self.pos < src.len() {
            let rest = &src[self.pos..];

            if rest.starts_with('\n') {
                self.line_break()?;
            } else if let Some(kind) = self.line_comment_kind(rest) {
                let end = self.line_end(self.pos);
                self.comment_at = Some(self.pos);
                self.emit(kind, end);
            } else if let Some((len, body)) = self.heredoc_start(rest) {
                self.pending.push(body);
                self.pos += len;
            } else if let Some((open, close)) = self.block_comment_start(rest) {
                let kind = if self.is_doc_block(rest) {
                    SegmentKind::DocComment { block: true }
                } else {
                    SegmentKind::Comment { block: true }
                };
                let end = self.block_comment_end(open, close)?;
                self.emit(kind, end);
            } else if let Some(end) = self.literal_end(rest)? {
                self.emit(SegmentKind::Literal, end);
            } else {
                self.pos += rest.chars().next().map_or(1, char::len_utf8);
            }
        }

        self.flush_code();
        Ok(())
    }

    /// Handles the newline at the current position. Pending bodies become
    /// one literal segment that starts with the newline, so the lines inside
    /// it count as continuation lines.
    fn line_break(&mut self) -> Result<(), FallbackReason> {
        if self.syntax.block_scalars {
            let line = &self.src[self.line_start..self.comment_at.unwrap_or(self.pos)];
            if opens_block_scalar(line) {
                self.pending.push(Body::Indented {
                    parent: block_parent_indent(line),
                });
            }
        }

        let mut end = self.pos;
        for body in std::mem::take(&mut self.pending) {
            end = match body {
                Body::Heredoc {
                    tag,
                    indented,
                    trailing,
                } => heredoc_end(self.src, end, tag, indented, trailing)
                    .ok_or(FallbackReason::UnterminatedString)?,
                Body::Indented { parent } => indented_end(self.src, end, parent),
            };
        }

        if end > self.pos {
            self.emit(SegmentKind::Literal, end);
        } else {
            self.pos += 1;
        }
        self.line_start = self.pos;
        self.comment_at = None;
        Ok(())
    }

    /// Length of a heredoc operator and its tag at the start of `rest`. The
    /// operator only counts when its terminator line exists.
    fn heredoc_start(&self, rest: &'a str) -> Option<(usize, Body<'a>)> {
        let style = self.syntax.heredocs?;
        if self.prev_char() == Some('<') {
            return None;
        }

        let (indented, word) = match style {
            Heredoc::Shell => {
                let after = rest.strip_prefix("<<").filter(|a| !a.starts_with('<'))?;
                let (indented, after) = strip_flag(after, &['-']);
                (indented, after.trim_start_matches([' ', '\t']))
            }
            Heredoc::Ruby => {
                let after = rest.strip_prefix("<<").filter(|a| !a.starts_with('<'))?;
                strip_flag(after, &['-', '~'])
            }
            Heredoc::Php => (true, rest.strip_prefix("<<<")?.trim_start_matches([' ', '\t'])),
        };

        let (tag, tag_len) = heredoc_tag(word)?;
        let trailing = style == Heredoc::Php;
        heredoc_end(self.src, self.line_end(self.pos), tag, indented, trailing)?;
        let body = Body::Heredoc {
            tag,
            indented,
            trailing,
        };
        Some((rest.len() - word.len() + tag_len, body))
    }

    fn flush_code(&mut self) {
        if self.code_start < self.pos {
            self.segments.push(Segment {
                kind: SegmentKind::Code,
                text: &self.src[self.code_start..self.pos],
            });
        }
        self.code_start = self.pos;
    }

    fn emit(&mut self, kind: SegmentKind, end: usize) {
        self.flush_code();
        self.segments.push(Segment {
            kind,
            text: &self.src[self.pos..end],
        });
        self.pos = end;
        self.code_start = end;
    }

    fn line_end(&self, from: usize) -> usize {
        self.src[from..].find('\n').map_or(self.src.len(), |i| from + i)
    }

    fn prev_char(&self) -> Option<char> {
        self.src[..self.pos].chars().next_back()
    }

    fn at_word_start(&self) -> bool {
        !self.prev_char().is_some_and(is_ident_char)
    }

    fn line_comment_kind(&self, rest: &str) -> Option<SegmentKind> {
        let syntax = self.syntax;

        if syntax.directives.iter().any(|d| rest.starts_with(d)) {
            return Some(SegmentKind::Directive);
        }

        let doc = syntax.doc_line_prefixes.iter().any(|prefix| {
            rest.starts_with(prefix) && !rest[prefix.len()..].starts_with(&prefix[prefix.len() - 1..])
        });
        if doc {
            return Some(SegmentKind::DocComment { block: false });
        }

        let marker = syntax.line_comments.iter().find(|m| rest.starts_with(**m))?;
        match *marker {
            "#" if syntax.hash_needs_space && self.prev_char().is_some_and(|c| !c.is_whitespace()) => None,
            "#" if syntax.hash_attribute_guard && rest.starts_with("#[") => None,
            "//" if syntax.url_guard && self.prev_char() == Some(':') => None,
            _ => Some(SegmentKind::Comment { block: false }),
        }
    }

    fn block_comment_start(&self, rest: &str) -> Option<(&'static str, &'static str)> {
        self.syntax
            .block_comment
            .filter(|(open, _)| rest.starts_with(open))
    }

    fn is_doc_block(&self, rest: &str) -> bool {
        self.syntax.doc_block_prefixes.iter().any(|prefix| {
            // `/**/` is an empty comment, `/***` a decorative banner
            rest.starts_with(prefix)
                && !rest[prefix.len()..].starts_with('/')
                && !rest[prefix.len()..].starts_with('*')
        })
    }

    fn block_comment_end(&self, open: &str, close: &str) -> Result<usize, FallbackReason> {
        let bytes = self.src.as_bytes();
        let mut depth = 1usize;
        let mut i = self.pos + open.len();

        while i < bytes.len() {
            let rest = &self.src[i..];
            if rest.starts_with(close) {
                depth -= 1;
                i += close.len();
                if depth == 0 {
                    return Ok(i);
                }
            } else if self.syntax.nested_block_comments && rest.starts_with(open) {
                depth += 1;
                i += open.len();
            } else {
                i += rest.chars().next().map_or(1, char::len_utf8);
            }
        }

        Err(FallbackReason::UnterminatedComment)
    }

    /// Returns the end offset if a literal starts at the current position.
    fn literal_end(&self, rest: &str) -> Result<Option<usize>, FallbackReason> {
        let syntax = self.syntax;
        let Some(first) = rest.chars().next() else {
            return Ok(None);
        };

        if syntax.rust_literals && self.at_word_start() {
            if let Some(end) = self.rust_raw_string_end(rest)? {
                return Ok(Some(end));
            }
            if first == 'b' && rest[1..].starts_with(['\'', '"']) {
                return self.quoted_end(self.pos + 1, true).map(Some);
            }
        }

        if syntax.rust_literals && first == '\'' {
            return Ok(self.rust_char_end(rest));
        }

        if syntax.regex_literals && first == '/' && self.regex_allowed() {
            if let Some(len) = regex_len(rest) {
                return Ok(Some(self.pos + len));
            }
        }

        let prefix_len = self.string_prefix_len(rest);
        let body = &rest[prefix_len..];
        let start = self.pos + prefix_len;

        if let Some(triple) = syntax.triple_quotes.iter().find(|t| body.starts_with(**t)) {
            return self.triple_quoted_end(start, triple).map(Some);
        }

        let Some(quote) = body.chars().next().filter(|c| syntax.quotes.contains(c)) else {
            return Ok(None);
        };
        if prefix_len == 0 && syntax.quote_needs_boundary && !self.quote_boundary() {
            return Ok(None);
        }

        let escapes = !(quote == '\'' && syntax.raw_single_quotes);
        self.quoted_end(start, escapes).map(Some)
    }

    fn string_prefix_len(&self, rest: &str) -> usize {
        let prefixes = self.syntax.string_prefixes;
        if prefixes.is_empty() || !self.at_word_start() {
            return 0;
        }
        let len = rest
            .chars()
            .take(2)
            .take_while(|c| prefixes.contains(*c))
            .count();
        if len > 0 && rest[len..].starts_with(|c: char| self.syntax.quotes.contains(&c)) {
            len
        } else {
            0
        }
    }

    fn quote_boundary(&self) -> bool {
        self.prev_char()
            .is_none_or(|c| c.is_whitespace() || matches!(c, '[' | '{' | ',' | ':' | '-' | '('))
    }

    /// Scans a quoted literal whose opening quote is at `start`.
    fn quoted_end(&self, start: usize, escapes: bool) -> Result<usize, FallbackReason> {
        let mut chars = self.src[start..].char_indices();
        let Some((_, quote)) = chars.next() else {
            return Err(FallbackReason::UnterminatedString);
        };
        let multiline = self.syntax.multiline_quotes.contains(&quote);

        while let Some((offset, ch)) = chars.next() {
            match ch {
                '\\' if escapes => {
                    chars.next();
                }
                '\n' if !multiline => return Err(FallbackReason::UnterminatedString),
                c if c == quote => return Ok(start + offset + c.len_utf8()),
                _ => {}
            }
        }

        Err(FallbackReason::UnterminatedString)
    }

    fn triple_quoted_end(&self, start: usize, triple: &str) -> Result<usize, FallbackReason> {
        let body_start = start + triple.len();
        let mut chars = self.src[body_start..].char_indices();

        while let Some((offset, ch)) = chars.next() {
            if ch == '\\' {
                chars.next();
            } else if self.src[body_start + offset..].starts_with(triple) {
                return Ok(body_start + offset + triple.len());
            }
        }

        Err(FallbackReason::UnterminatedString)
    }

    fn rust_raw_string_end(&self, rest: &str) -> Result<Option<usize>, FallbackReason> {
        let after_b = rest.strip_prefix('b').unwrap_or(rest);
        let Some(after_r) = after_b.strip_prefix('r') else {
            return Ok(None);
        };
        let hashes = after_r.chars().take_while(|&c| c == '#').count();
        if !after_r[hashes..].starts_with('"') {
            return Ok(None);
        }

        let body_start = self.pos + (rest.len() - after_r.len()) + hashes + 1;
        let closing = format!("\"{}", "#".repeat(hashes));
        self.src[body_start..]
            .find(&closing)
            .map(|i| Some(body_start + i + closing.len()))
            .ok_or(FallbackReason::UnterminatedString)
    }

    /// Character literal, or `None` for a lifetime or label.
    fn rust_char_end(&self, rest: &str) -> Option<usize> {
        let mut chars = rest.char_indices().skip(1);
        let (_, first) = chars.next()?;
        if first == '\\' {
            let end = 3 + rest.get(3..)?.find('\'')?;
            return (!rest[..end].contains('\n')).then_some(self.pos + end + 1);
        }
        match chars.next() {
            Some((i, '\'')) => Some(self.pos + i + 1),
            _ => None,
        }
    }

    fn regex_allowed(&self) -> bool {
        let before = self.src[..self.pos].trim_end();
        match before.chars().next_back() {
            None => true,
            Some(c) if "(,=:[!&|?{};+-*%<>~^".contains(c) => true,
            Some(c) if is_ident_char(c) => {
                let word_start = before
                    .char_indices()
                    .rev()
                    .take_while(|(_, ch)| is_ident_char(*ch))
                    .last()
                    .map_or(0, |(i, _)| i);
                matches!(&before[word_start..], "return" | "typeof" | "case" | "in" | "of" | "yield")
            }
            Some(_) => false,
        }
    }
}

/// Length of a regex literal at the start of `rest`, if one is there.
fn regex_len(rest: &str) -> Option<usize> {
    if rest.starts_with("//") || rest.starts_with("/*") {
        return None;
    }

    let mut in_class = false;
    let mut chars = rest.char_indices().skip(1);
    while let Some((i, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '\n' => return None,
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => {
                let flags = rest[i + 1..]
                    .chars()
                    .take_while(char::is_ascii_alphabetic)
                    .count();
                return Some(i + 1 + flags);
            }
            _ => {}
        }
    }
    None
}

fn strip_flag<'s>(s: &'s str, flags: &[char]) -> (bool, &'s str) {
    s.strip_prefix(flags).map_or((false, s), |rest| (true, rest))
}

/// Heredoc tag at the start of `word` and the length it spans, quotes
/// included.
fn heredoc_tag(word: &str) -> Option<(&str, usize)> {
    if let Some(quote) = word.chars().next().filter(|c| matches!(c, '\'' | '"')) {
        let close = word[1..].find(quote)?;
        let tag = &word[1..=close];
        return (!tag.is_empty() && !tag.contains('\n')).then_some((tag, close + 2));
    }
    let len: usize = word
        .chars()
        .take_while(|&c| is_ident_char(c))
        .map(char::len_utf8)
        .sum();
    let tag = &word[..len];
    tag.starts_with(|c: char| c.is_alphabetic() || c == '_')
        .then_some((tag, len))
}

/// End of the terminator tag of a heredoc whose body follows the newline
/// at `newline`.
fn heredoc_end(src: &str, newline: usize, tag: &str, indented: bool, trailing: bool) -> Option<usize> {
    let mut start = newline + 1;
    while start < src.len() {
        let end = src[start..].find('\n').map_or(src.len(), |i| start + i);
        let line = src[start..end].trim_end();
        let body = if indented {
            line.trim_start_matches([' ', '\t'])
        } else {
            line
        };
        let terminates = match body.strip_prefix(tag) {
            Some("") => true,
            Some(after) => trailing && !after.starts_with(is_ident_char),
            None => false,
        };
        if terminates {
            return Some(start + (line.len() - body.len()) + tag.len());
        }
        start = end + 1;
    }
    None
}

/// End of the last line after `newline` that is indented past `parent`.
/// Blank lines in between belong to the body.
fn indented_end(src: &str, newline: usize, parent: usize) -> usize {
    let mut end = newline;
    let mut start = newline + 1;
    while start < src.len() {
        let line_end = src[start..].find('\n').map_or(src.len(), |i| start + i);
        let line = &src[start..line_end];
        let body = line.trim_start_matches(' ');
        if !body.trim().is_empty() {
            if line.len() - body.len() <= parent {
                break;
            }
            end = line_end;
        }
        start = line_end + 1;
    }
    end
}

/// Whether a YAML line ends in a `|` or `>` block indicator, with optional
/// chomping and indentation indicators.
fn opens_block_scalar(line: &str) -> bool {
    let value = line
        .trim_end()
        .trim_end_matches(|c: char| c == '+' || c == '-' || c.is_ascii_digit());
    value
        .strip_suffix(['|', '>'])
        .is_some_and(|head| head.is_empty() || head.ends_with(' '))
}

/// Indentation the body of a block scalar must exceed: the column of the
/// key, past any `- ` markers, or the marker itself for `- |`.
fn block_parent_indent(line: &str) -> usize {
    let body = line.trim_start_matches(' ');
    let leading = line.len() - body.len();
    let mut rest = body;
    while let Some(after) = rest.strip_prefix('-').filter(|a| a.starts_with(' ')) {
        rest = after.trim_start_matches(' ');
    }
    if rest.starts_with(['|', '>']) {
        leading
    } else {
        leading + body.len() - rest.len()
    }
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Marks string literals that open a module, `def` or `class` body.
fn mark_python_docstrings(segments: &mut [Segment<'_>]) {
    let mut expect_doc = true;
    let mut line_has_content = false;
    let mut depth = 0i32;
    let mut first_word = String::new();
    let mut collecting_word = false;
    let mut last_significant = ' ';
    let mut continued = false;

    for segment in segments.iter_mut() {
        match segment.kind {
            SegmentKind::Code => {
                for ch in segment.text.chars() {
                    if ch == '\n' {
                        if depth <= 0 && !continued && line_has_content {
                            let header = matches!(first_word.as_str(), "def" | "class" | "async");
                            expect_doc = header && last_significant == ':';
                            line_has_content = false;
                            first_word.clear();
                        }
                        continued = false;
                        collecting_word = false;
                        continue;
                    }
                    continued = ch == '\\';
                    if ch.is_whitespace() {
                        collecting_word = false;
                        continue;
                    }
                    if !line_has_content {
                        line_has_content = true;
                        collecting_word = true;
                    }
                    if collecting_word && is_ident_char(ch) {
                        first_word.push(ch);
                    } else {
                        collecting_word = false;
                    }
                    match ch {
                        '(' | '[' | '{' => depth += 1,
                        ')' | ']' | '}' => depth -= 1,
                        _ => {}
                    }
                    last_significant = ch;
                }
            }
            SegmentKind::Literal => {
                if expect_doc && !line_has_content && depth <= 0 {
                    segment.kind = SegmentKind::Docstring;
                }
                expect_doc = false;
                line_has_content = true;
                collecting_word = false;
                continued = false;
                last_significant = '"';
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::profile;
    use crate::language::Language;

    fn syntax(language: Language) -> &'static Syntax {
        &profile::source_profile(language).unwrap().syntax
    }

    fn kinds(src: &str, language: Language) -> Vec<(SegmentKind, &str)> {
        lex(src, syntax(language))
            .unwrap()
            .into_iter()
            .map(|s| (s.kind, s.text))
            .collect()
    }

    #[test]
    fn test_segments_reassemble_input() {
        let src = "let a = \"x // y\"; // c\n/* b */ let z = 'q';\n";
        let text: String = lex(src, syntax(Language::Rust))
            .unwrap()
            .iter()
            .map(|s| s.text)
            .collect();
        assert_eq!(text, src);
    }

    #[test]
    fn test_comment_markers_inside_strings_are_code() {
        let segments = kinds("s = \"# no\"  # yes\n", Language::Python);
        assert_eq!(
            segments,
            vec![
                (SegmentKind::Code, "s = "),
                (SegmentKind::Literal, "\"# no\""),
                (SegmentKind::Code, "  "),
                (SegmentKind::Comment { block: false }, "# yes"),
                (SegmentKind::Code, "\n"),
            ]
        );
    }

    #[test]
    fn test_rust_doc_comments() {
        let segments = kinds("/// doc\n//// banner\n//! inner\n", Language::Rust);
        assert_eq!(segments[0], (SegmentKind::DocComment { block: false }, "/// doc"));
        assert_eq!(segments[2], (SegmentKind::Comment { block: false }, "//// banner"));
        assert_eq!(segments[4], (SegmentKind::DocComment { block: false }, "//! inner"));
    }

    #[test]
    fn test_rust_lifetimes_and_raw_strings() {
        let segments = kinds("fn f<'a>(x: &'a str) { let c = '\\n'; r#\"q\"\"# }", Language::Rust);
        let literals: Vec<_> = segments
            .iter()
            .filter(|(k, _)| *k == SegmentKind::Literal)
            .map(|(_, t)| *t)
            .collect();
        assert_eq!(literals, vec!["'\\n'", "r#\"q\"\"#"]);
    }

    #[test]
    fn test_nested_block_comments() {
        let segments = kinds("/* a /* b */ c */x", Language::Rust);
        assert_eq!(segments[0], (SegmentKind::Comment { block: true }, "/* a /* b */ c */"));
        assert_eq!(segments[1], (SegmentKind::Code, "x"));
    }

    #[test]
    fn test_unterminated_constructs() {
        assert_eq!(
            lex("x = \"open\ny\n", syntax(Language::Python)),
            Err(FallbackReason::UnterminatedString)
        );
        assert_eq!(
            lex("int x; /* open", syntax(Language::C)),
            Err(FallbackReason::UnterminatedComment)
        );
        assert_eq!(
            lex("s = '''never", syntax(Language::Python)),
            Err(FallbackReason::UnterminatedString)
        );
    }

    #[test]
    fn test_javascript_regex_and_division() {
        let segments = kinds("x = a / b; y = /[/]\\//g;", Language::JavaScript);
        let literals: Vec<_> = segments
            .iter()
            .filter(|(k, _)| *k == SegmentKind::Literal)
            .map(|(_, t)| *t)
            .collect();
        assert_eq!(literals, vec!["/[/]\\//g"]);
    }

    #[test]
    fn test_template_literals_span_lines() {
        let segments = kinds("const t = `a\n// b`;", Language::JavaScript);
        assert_eq!(segments[1], (SegmentKind::Literal, "`a\n// b`"));
    }

    #[test]
    fn test_directives() {
        let go = kinds("//go:build linux\n// plain\n", Language::Go);
        assert_eq!(go[0].0, SegmentKind::Directive);
        assert_eq!(go[2].0, SegmentKind::Comment { block: false });

        let ts = kinds("/// <reference path=\"a.d.ts\" />\n", Language::TypeScript);
        assert_eq!(ts[0].0, SegmentKind::Directive);

        let sh = kinds("#!/bin/sh\n# c\n", Language::Bash);
        assert_eq!(sh[0], (SegmentKind::Directive, "#!/bin/sh"));
        assert_eq!(sh[2].0, SegmentKind::Comment { block: false });
    }

    #[test]
    fn test_bash_hash_inside_word_is_code() {
        let segments = kinds("echo $# ${#x} a#b # c\n", Language::Bash);
        assert_eq!(segments[0], (SegmentKind::Code, "echo $# ${#x} a#b "));
        assert_eq!(segments[1], (SegmentKind::Comment { block: false }, "# c"));
    }

    #[test]
    fn test_yaml_apostrophes_in_plain_scalars() {
        let segments = kinds("msg: don't panic # note\n", Language::Yaml);
        assert_eq!(segments[0], (SegmentKind::Code, "msg: don't panic "));
    }

    #[test]
    fn test_scss_urls_are_not_comments() {
        let segments = kinds("a { background: url(http://x/y.png); }\n", Language::Scss);
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_python_docstring_positions() {
        let src = "\"\"\"module\"\"\"\nx = \"\"\"not doc\"\"\"\n@dec\ndef f(\n    a,\n):\n    # c\n    'doc'\n    'not doc'\nclass C:\n    \"\"\"cls\"\"\"\nif x:\n    \"\"\"not doc\"\"\"\n";
        let docs: Vec<_> = kinds(src, Language::Python)
            .into_iter()
            .filter(|(k, _)| *k == SegmentKind::Docstring)
            .map(|(_, t)| t)
            .collect();
        assert_eq!(docs, vec!["\"\"\"module\"\"\"", "'doc'", "\"\"\"cls\"\"\""]);
    }

    #[test]
    fn test_bash_heredoc_body_is_literal() {
        let src = "cat <<EOF >out # c\n  # not a comment\n    x\nEOF\necho done\n";
        let segments = kinds(src, Language::Bash);
        assert_eq!(
            segments,
            vec![
                (SegmentKind::Code, "cat <<EOF >out "),
                (SegmentKind::Comment { block: false }, "# c"),
                (SegmentKind::Literal, "\n  # not a comment\n    x\nEOF"),
                (SegmentKind::Code, "\necho done\n"),
            ]
        );
    }

    #[test]
    fn test_heredoc_variants() {
        let quoted = kinds("cat <<-'END'\n\tkeep\n\tEND\n", Language::Bash);
        assert_eq!(quoted[1], (SegmentKind::Literal, "\n\tkeep\n\tEND"));

        let ruby = kinds("s = <<~SQL.strip\n    select 1\n  SQL\n", Language::Ruby);
        assert_eq!(ruby[1], (SegmentKind::Literal, "\n    select 1\n  SQL"));

        let php = kinds("$s = <<<EOT\n  a  b\n  EOT;\n", Language::Php);
        assert_eq!(php[0], (SegmentKind::Code, "$s = <<<EOT"));
        assert_eq!(php[1], (SegmentKind::Literal, "\n  a  b\n  EOT"));
        assert_eq!(php[2], (SegmentKind::Code, ";\n"));
    }

    #[test]
    fn test_shift_operators_are_not_heredocs() {
        for (src, language) in [
            ("echo $((1 << 2))\n", Language::Bash),
            ("cat <<<\"$x\"\n", Language::Bash),
            ("class << self\nend\n", Language::Ruby),
            ("cat <<EOF\nno terminator\n", Language::Bash),
        ] {
            let segments = kinds(src, language);
            assert!(
                segments.iter().all(|(k, t)| *k != SegmentKind::Literal || !t.starts_with('\n')),
                "{src:?} lexed a body"
            );
        }
    }

    #[test]
    fn test_yaml_block_scalar_body_is_literal() {
        let src = "steps:\n  - run: |\n      # setup\n      make\n\n      make test\n  - name: x\n";
        let segments = kinds(src, Language::Yaml);
        assert_eq!(
            segments,
            vec![
                (SegmentKind::Code, "steps:\n  - run: |"),
                (SegmentKind::Literal, "\n      # setup\n      make\n\n      make test"),
                (SegmentKind::Code, "\n  - name: x\n"),
            ]
        );
    }

    #[test]
    fn test_block_scalar_indicators() {
        assert!(opens_block_scalar("key: |"));
        assert!(opens_block_scalar("key: >-"));
        assert!(opens_block_scalar("- |2+"));
        assert!(opens_block_scalar("|"));
        assert!(!opens_block_scalar("key: a|"));
        assert!(!opens_block_scalar("---"));
        assert!(!opens_block_scalar("count: 12"));

        assert_eq!(block_parent_indent("  - run: |"), 4);
        assert_eq!(block_parent_indent("  - |"), 2);
        assert_eq!(block_parent_indent("    script: >"), 4);
    }

    #[test]
    fn test_python_string_prefixes() {
        let segments = kinds("x = rb'\\d' + f\"{y}\"\n", Language::Python);
        let literals: Vec<_> = segments
            .iter()
            .filter(|(k, _)| *k == SegmentKind::Literal)
            .map(|(_, t)| *t)
            .collect();
        assert_eq!(literals, vec!["rb'\\d'", "f\"{y}\""]);
    }
}
