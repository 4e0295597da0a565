//! Comment stripping, re-indentation and punctuation spacing for source code.

use super::lexer::{Segment, SegmentKind, lex};
use super::profile::{Indent, Profile};
use super::whitespace::{DepthTracker, indent_width};
use super::{FallbackReason, LanguageOptimizer, OptimizationConfig, OptimizationLevel, Outcome};

/// Transform for languages described by a [`Profile`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct SourceOptimizer {
    profile: &'static Profile,
}

impl SourceOptimizer {
    pub(crate) const fn new(profile: &'static Profile) -> Self {
        Self { profile }
    }

    pub(crate) fn apply(
        &self,
        content: &str,
        config: &OptimizationConfig,
    ) -> Result<String, FallbackReason> {
        let syntax = &self.profile.syntax;
        let stripped = strip_comments(&lex(content, syntax)?, config);
        let segments = lex(&stripped, syntax)?;
        Ok(render_lines(&segments, self.profile))
    }
}

impl LanguageOptimizer for SourceOptimizer {
    fn transform(&self, content: &str, config: &OptimizationConfig) -> Outcome {
        self.apply(content, config)
            .map_or_else(Outcome::WhitespaceOnly, Outcome::Optimized)
    }
}

/// Whether a segment of this kind is deleted under `config`.
pub(crate) fn removable(kind: SegmentKind, config: &OptimizationConfig) -> bool {
    let aggressive = config.level >= OptimizationLevel::Aggressive;
    let strip_line = aggressive || !config.preserve_comments;

    match kind {
        SegmentKind::Comment { block: false } => strip_line,
        SegmentKind::Comment { block: true } => aggressive,
        SegmentKind::DocComment { block } if !config.preserve_docstrings => {
            if block { aggressive } else { strip_line }
        }
        _ => false,
    }
}

/// Deletes removable comments. A comment alone on its line takes the line
/// with it; an inline block comment between two tokens becomes one space.
pub(crate) fn strip_comments(segments: &[Segment<'_>], config: &OptimizationConfig) -> String {
    let mut out = String::with_capacity(segments.iter().map(|s| s.text.len()).sum());
    let mut drop_line_break = false;

    for (index, segment) in segments.iter().enumerate() {
        if removable(segment.kind, config) {
            let line_start = out.rfind('\n').map_or(0, |i| i + 1);
            let alone = out[line_start..].trim().is_empty()
                && rest_of_line_blank(&segments[index + 1..], config);

            if alone {
                out.truncate(line_start);
                drop_line_break = true;
            } else if joins_tokens(&out, segments.get(index + 1)) {
                out.push(' ');
            }
            continue;
        }

        let mut text = segment.text;
        if drop_line_break {
            drop_line_break = false;
            if segment.kind == SegmentKind::Code {
                match text.find('\n') {
                    Some(i) if text[..i].trim().is_empty() => text = &text[i + 1..],
                    None if text.trim().is_empty() => {
                        drop_line_break = true;
                        continue;
                    }
                    _ => {}
                }
            }
        }
        out.push_str(text);
    }

    out
}

fn rest_of_line_blank(rest: &[Segment<'_>], config: &OptimizationConfig) -> bool {
    for segment in rest {
        if removable(segment.kind, config) {
            continue;
        }
        if segment.kind != SegmentKind::Code {
            return false;
        }
        match segment.text.find('\n') {
            Some(i) => return segment.text[..i].trim().is_empty(),
            None if segment.text.trim().is_empty() => {}
            None => return false,
        }
    }
    true
}

fn joins_tokens(out: &str, next: Option<&Segment<'_>>) -> bool {
    let before = out.chars().next_back();
    let after = next.and_then(|s| s.text.chars().next());
    matches!((before, after), (Some(b), Some(a)) if !b.is_whitespace() && !a.is_whitespace())
}

struct Line<'a> {
    pieces: Vec<Segment<'a>>,
    /// The line begins inside a multi-line literal or comment.
    continued: bool,
}

impl Line<'_> {
    /// Holds a comment and nothing else, so it says nothing about nesting.
    fn is_comment_only(&self) -> bool {
        let mut comment = false;
        for piece in &self.pieces {
            match piece.kind {
                SegmentKind::Comment { .. } | SegmentKind::DocComment { .. } | SegmentKind::Directive => {
                    comment = true;
                }
                SegmentKind::Code if piece.text.trim().is_empty() => {}
                _ => return false,
            }
        }
        comment
    }
}

fn split_lines<'a>(segments: &[Segment<'a>]) -> Vec<Line<'a>> {
    let mut lines = vec![Line {
        pieces: Vec::new(),
        continued: false,
    }];

    for segment in segments {
        for (i, part) in segment.text.split('\n').enumerate() {
            if i > 0 {
                lines.push(Line {
                    pieces: Vec::new(),
                    continued: !segment.kind.is_code(),
                });
            }
            if part.is_empty() {
                continue;
            }
            if let Some(line) = lines.last_mut() {
                line.pieces.push(Segment {
                    kind: segment.kind,
                    text: part,
                });
            }
        }
    }

    lines
}

/// Re-renders segments line by line with canonical indentation and
/// collapsed punctuation spacing.
pub(crate) fn render_lines(segments: &[Segment<'_>], profile: &Profile) -> String {
    let mut columns = DepthTracker::default();
    let mut rendered = Vec::new();

    for line in split_lines(segments) {
        let mut text = collapse_spacing(&line, profile);
        if !line.continued && !text.trim().is_empty() {
            let body = text.trim_start_matches([' ', '\t']);
            let width = indent_width(&text[..text.len() - body.len()]);
            let column = if line.is_comment_only() {
                columns.peek(width)
            } else {
                columns.column_for(width)
            };
            if profile.indent == Indent::Yaml {
                let marker = sequence_marker_len(body);
                if marker > 0 {
                    columns.open(width + marker, column + marker);
                }
            }
            text = format!("{}{body}", " ".repeat(column));
        }
        rendered.push(text);
    }

    rendered.join("\n")
}

/// Width of the `- ` markers opening a YAML sequence item when content
/// follows them on the same line.
fn sequence_marker_len(body: &str) -> usize {
    let mut rest = body;
    while let Some(after) = rest.strip_prefix('-').filter(|a| a.starts_with(' ')) {
        rest = after.trim_start_matches(' ');
    }
    if rest.is_empty() || rest.starts_with('#') {
        0
    } else {
        body.len() - rest.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Neighbor {
    Edge,
    Opaque,
    Delimiter,
    Operator,
    Word,
}

impl Neighbor {
    fn of_char(ch: char, profile: &Profile) -> Self {
        if profile.delimiters.contains(ch) {
            Self::Delimiter
        } else if profile.operators.contains(ch) {
            Self::Operator
        } else {
            Self::Word
        }
    }

    fn of_piece(piece: &Segment<'_>, last: bool, profile: &Profile) -> Self {
        match piece.kind {
            SegmentKind::Code => {
                let ch = if last {
                    piece.text.chars().next_back()
                } else {
                    piece.text.chars().next()
                };
                ch.map_or(Self::Edge, |c| Self::of_char(c, profile))
            }
            SegmentKind::Literal | SegmentKind::Docstring => Self::Word,
            _ => Self::Opaque,
        }
    }
}

fn droppable(before: Neighbor, after: Neighbor) -> bool {
    use Neighbor::{Delimiter, Edge, Opaque, Operator, Word};
    match (before, after) {
        (Edge | Opaque, _) | (_, Edge | Opaque) => false,
        (Delimiter, _) | (_, Delimiter) => true,
        (Operator, Word) | (Word, Operator) => true,
        _ => false,
    }
}

fn collapse_spacing(line: &Line<'_>, profile: &Profile) -> String {
    let no_rules = profile.delimiters.is_empty() && profile.operators.is_empty();
    let preprocessor = profile.preprocessor
        && line
            .pieces
            .first()
            .filter(|p| p.kind == SegmentKind::Code)
            .and_then(|p| p.text.trim_start().chars().next())
            == Some('#');

    if no_rules || preprocessor {
        return line.pieces.iter().map(|p| p.text).collect();
    }

    let mut out = String::new();
    for (index, piece) in line.pieces.iter().enumerate() {
        if piece.kind != SegmentKind::Code {
            out.push_str(piece.text);
            continue;
        }
        let before = index
            .checked_sub(1)
            .map_or(Neighbor::Edge, |i| Neighbor::of_piece(&line.pieces[i], true, profile));
        let after = line
            .pieces
            .get(index + 1)
            .map_or(Neighbor::Edge, |p| Neighbor::of_piece(p, false, profile));
        collapse_runs(piece.text, before, after, profile, &mut out);
    }
    out
}

fn collapse_runs(text: &str, before: Neighbor, after: Neighbor, profile: &Profile, out: &mut String) {
    let is_blank = |c: char| c == ' ' || c == '\t';
    let mut prev = before;
    let mut chars = text.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        if !is_blank(ch) {
            out.push(ch);
            prev = Neighbor::of_char(ch, profile);
            continue;
        }

        let mut end = start + 1;
        while let Some(&(i, c)) = chars.peek() {
            if !is_blank(c) {
                break;
            }
            end = i + 1;
            chars.next();
        }

        let next = text[end..]
            .chars()
            .next()
            .map_or(after, |c| Neighbor::of_char(c, profile));
        if !droppable(prev, next) {
            out.push_str(&text[start..end]);
        }
    }
}
