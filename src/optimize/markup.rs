//! HTML and XML transforms.

use super::lexer::{Segment, SegmentKind, Syntax};
use super::profile::{Indent, Profile};
use super::source::{render_lines, strip_comments};
use super::{FallbackReason, LanguageOptimizer, OptimizationConfig, OptimizationLevel, Outcome};

const MARKUP: Profile = Profile {
    syntax: Syntax::PLAIN,
    indent: Indent::Nesting,
    delimiters: "",
    operators: "",
    preprocessor: false,
};

/// Elements whose body is kept byte for byte.
const RAW_ELEMENTS: &[&str] = &["script", "style", "pre", "textarea"];

/// Elements next to which whitespace between tags never renders.
const BLOCK_ELEMENTS: &[&str] = &[
    "!doctype", "address", "article", "aside", "base", "blockquote", "body", "br", "caption", "col",
    "colgroup", "dd", "details", "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hr", "html", "legend", "li",
    "link", "main", "menu", "meta", "nav", "noscript", "ol", "optgroup", "option", "p", "pre",
    "script", "section", "select", "style", "summary", "table", "tbody", "td", "template", "tfoot",
    "th", "thead", "title", "tr", "ul",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Html,
    Xml,
}

/// Transform for HTML and XML documents.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkupOptimizer {
    dialect: Dialect,
}

impl MarkupOptimizer {
    pub(crate) const fn html() -> Self {
        Self {
            dialect: Dialect::Html,
        }
    }

    pub(crate) const fn xml() -> Self {
        Self {
            dialect: Dialect::Xml,
        }
    }

    fn apply(&self, content: &str, config: &OptimizationConfig) -> Result<String, FallbackReason> {
        let stripped = strip_comments(&self.lex(content)?, config);
        let joined;
        let mut segments = self.lex(&stripped)?;

        if config.level >= OptimizationLevel::Aggressive {
            joined = self.join_tags(&segments);
            segments = self.lex(&joined)?;
        }

        Ok(render_lines(&segments, &MARKUP))
    }

    fn lex<'a>(&self, src: &'a str) -> Result<Vec<Segment<'a>>, FallbackReason> {
        let lower = src.to_ascii_lowercase();
        let mut segments = Vec::new();
        let mut pos = 0;
        let mut text_start = 0;

        while pos < src.len() {
            let Some((kind, end)) = construct_at(&src[pos..])? else {
                pos += src[pos..].chars().next().map_or(1, char::len_utf8);
                continue;
            };
            let end = pos + end;
            let text = &src[pos..end];

            push_text(&mut segments, &src[text_start..pos]);
            segments.push(Segment { kind, text });
            pos = end;
            text_start = end;

            if kind != SegmentKind::Tag || self.dialect != Dialect::Html {
                continue;
            }
            if let Some(name) = raw_element(text) {
                let closing = format!("</{name}");
                let close = lower[end..]
                    .find(&closing)
                    .map(|i| end + i)
                    .ok_or(FallbackReason::UnterminatedMarkup)?;
                if close > end {
                    segments.push(Segment {
                        kind: SegmentKind::Literal,
                        text: &src[end..close],
                    });
                }
                pos = close;
                text_start = close;
            }
        }

        push_text(&mut segments, &src[text_start..]);
        Ok(segments)
    }

    fn join_tags(&self, segments: &[Segment<'_>]) -> String {
        let mut out = String::new();
        for (index, segment) in segments.iter().enumerate() {
            let inter_tag = segment.kind == SegmentKind::Code
                && segment.text.contains('\n')
                && segment.text.trim().is_empty();
            if inter_tag && index > 0 {
                if let (Some(prev), Some(next)) = (segments.get(index - 1), segments.get(index + 1)) {
                    if self.insignificant_between(prev, next) {
                        continue;
                    }
                }
            }
            out.push_str(segment.text);
        }
        out
    }

    fn insignificant_between(&self, prev: &Segment<'_>, next: &Segment<'_>) -> bool {
        let markup = |s: &Segment<'_>| {
            matches!(
                s.kind,
                SegmentKind::Tag | SegmentKind::Directive | SegmentKind::Comment { .. }
            )
        };
        if !markup(prev) || !markup(next) {
            return false;
        }

        match self.dialect {
            Dialect::Xml => true,
            Dialect::Html => [prev, next].iter().any(|s| {
                s.kind != SegmentKind::Tag || BLOCK_ELEMENTS.contains(&tag_name(s.text).as_str())
            }),
        }
    }
}

impl LanguageOptimizer for MarkupOptimizer {
    fn transform(&self, content: &str, config: &OptimizationConfig) -> Outcome {
        self.apply(content, config)
            .map_or_else(Outcome::WhitespaceOnly, Outcome::Optimized)
    }
}

fn push_text<'a>(segments: &mut Vec<Segment<'a>>, text: &'a str) {
    if !text.is_empty() {
        segments.push(Segment {
            kind: SegmentKind::Code,
            text,
        });
    }
}

/// Recognizes a comment, CDATA section or tag at the start of `rest` and
/// returns its kind and length.
fn construct_at(rest: &str) -> Result<Option<(SegmentKind, usize)>, FallbackReason> {
    if rest.starts_with("<!--") {
        let end = rest[4..]
            .find("-->")
            .ok_or(FallbackReason::UnterminatedComment)?;
        // conditional comments change what older browsers render
        let kind = if rest.starts_with("<!--[if") || rest.starts_with("<!--<![endif") {
            SegmentKind::Directive
        } else {
            SegmentKind::Comment { block: true }
        };
        return Ok(Some((kind, 4 + end + 3)));
    }

    if rest.starts_with("<![CDATA[") {
        let end = rest.find("]]>").ok_or(FallbackReason::UnterminatedMarkup)?;
        return Ok(Some((SegmentKind::Literal, end + 3)));
    }

    let opens_tag = rest.starts_with('<')
        && rest[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
    if !opens_tag {
        return Ok(None);
    }

    let mut quote = None;
    for (i, ch) in rest.char_indices().skip(1) {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '>') => return Ok(Some((SegmentKind::Tag, i + 1))),
            (None, _) => {}
        }
    }
    Err(FallbackReason::UnterminatedMarkup)
}

/// Lowercased element name of a tag, including a leading `!` or `?`.
fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_alphanumeric() || matches!(c, '-' | ':' | '_' | '!' | '?' | '.'))
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Name of a raw element opened by `tag`, if any.
fn raw_element(tag: &str) -> Option<&'static str> {
    if tag.starts_with("</") || tag.ends_with("/>") {
        return None;
    }
    let name = tag_name(tag);
    RAW_ELEMENTS.iter().copied().find(|raw| *raw == name)
}
