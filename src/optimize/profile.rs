//! Per-language lexical and layout rules.

use super::lexer::{Heredoc, Syntax};
use crate::language::Language;

/// How leading whitespace is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Indent {
    /// Leading whitespace carries no meaning beyond nesting.
    Nesting,
    /// Nesting, plus `- ` sequence markers that place the item's content
    /// one column past the marker.
    Yaml,
}

/// Everything the source transform needs to know about a language.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Profile {
    pub(crate) syntax: Syntax,
    pub(crate) indent: Indent,
    /// Characters that never need surrounding spaces.
    pub(crate) delimiters: &'static str,
    /// Characters that need no space next to a word.
    pub(crate) operators: &'static str,
    /// `#` lines are preprocessor directives and keep their spacing.
    pub(crate) preprocessor: bool,
}

const C_DELIMITERS: &str = ",;()[]{}";
const C_OPERATORS: &str = "=+-*/%<>!&|^~?:";

const C_SYNTAX: Syntax = Syntax {
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    doc_line_prefixes: &["///"],
    doc_block_prefixes: &["/**"],
    quotes: &['"', '\''],
    ..Syntax::PLAIN
};

const C_FAMILY: Profile = Profile {
    syntax: C_SYNTAX,
    indent: Indent::Nesting,
    delimiters: C_DELIMITERS,
    operators: C_OPERATORS,
    preprocessor: false,
};

const C: Profile = Profile {
    preprocessor: true,
    ..C_FAMILY
};

const JAVA: Profile = Profile {
    syntax: Syntax {
        triple_quotes: &["\"\"\""],
        ..C_SYNTAX
    },
    ..C_FAMILY
};

const JAVASCRIPT: Profile = Profile {
    syntax: Syntax {
        quotes: &['"', '\'', '`'],
        multiline_quotes: &['`'],
        regex_literals: true,
        shebang: true,
        ..C_SYNTAX
    },
    ..C_FAMILY
};

const TYPESCRIPT: Profile = Profile {
    syntax: Syntax {
        directives: &["/// <reference", "/// <amd"],
        ..JAVASCRIPT.syntax
    },
    ..JAVASCRIPT
};

const DART: Profile = Profile {
    syntax: Syntax {
        nested_block_comments: true,
        triple_quotes: &["\"\"\"", "'''"],
        string_prefixes: "r",
        ..C_SYNTAX
    },
    ..C_FAMILY
};

const KOTLIN: Profile = Profile {
    syntax: Syntax {
        nested_block_comments: true,
        triple_quotes: &["\"\"\""],
        shebang: true,
        ..C_SYNTAX
    },
    ..C_FAMILY
};

// Swift treats operators with unbalanced spacing as prefix or postfix
const SWIFT: Profile = Profile {
    syntax: Syntax {
        nested_block_comments: true,
        triple_quotes: &["\"\"\""],
        quotes: &['"'],
        ..C_SYNTAX
    },
    delimiters: ",;",
    operators: "",
    ..C_FAMILY
};

const GO: Profile = Profile {
    syntax: Syntax {
        doc_line_prefixes: &[],
        doc_block_prefixes: &[],
        directives: &["//go:", "// +build", "//line "],
        quotes: &['"', '\'', '`'],
        multiline_quotes: &['`'],
        ..C_SYNTAX
    },
    ..C_FAMILY
};

const RUST: Profile = Profile {
    syntax: Syntax {
        nested_block_comments: true,
        doc_line_prefixes: &["///", "//!"],
        doc_block_prefixes: &["/**", "/*!"],
        quotes: &['"'],
        multiline_quotes: &['"'],
        rust_literals: true,
        ..C_SYNTAX
    },
    ..C_FAMILY
};

const PHP: Profile = Profile {
    syntax: Syntax {
        line_comments: &["//", "#"],
        multiline_quotes: &['"', '\''],
        heredocs: Some(Heredoc::Php),
        hash_attribute_guard: true,
        ..C_SYNTAX
    },
    ..C_FAMILY
};

const PYTHON: Profile = Profile {
    syntax: Syntax {
        line_comments: &["#"],
        quotes: &['"', '\''],
        triple_quotes: &["\"\"\"", "'''"],
        string_prefixes: "rRbBuUfF",
        shebang: true,
        python_docstrings: true,
        ..Syntax::PLAIN
    },
    indent: Indent::Nesting,
    delimiters: C_DELIMITERS,
    operators: "=+-*/%<>!&|^~:",
    preprocessor: false,
};

const RUBY: Profile = Profile {
    syntax: Syntax {
        line_comments: &["#"],
        quotes: &['"', '\''],
        multiline_quotes: &['"', '\''],
        heredocs: Some(Heredoc::Ruby),
        shebang: true,
        ..Syntax::PLAIN
    },
    indent: Indent::Nesting,
    delimiters: "",
    operators: "",
    preprocessor: false,
};

const BASH: Profile = Profile {
    syntax: Syntax {
        line_comments: &["#"],
        quotes: &['"', '\''],
        multiline_quotes: &['"', '\''],
        raw_single_quotes: true,
        hash_needs_space: true,
        heredocs: Some(Heredoc::Shell),
        shebang: true,
        ..Syntax::PLAIN
    },
    ..RUBY
};

const YAML: Profile = Profile {
    syntax: Syntax {
        line_comments: &["#"],
        quotes: &['"', '\''],
        multiline_quotes: &['"', '\''],
        raw_single_quotes: true,
        hash_needs_space: true,
        quote_needs_boundary: true,
        block_scalars: true,
        ..Syntax::PLAIN
    },
    indent: Indent::Yaml,
    ..RUBY
};

const TOML: Profile = Profile {
    syntax: Syntax {
        line_comments: &["#"],
        quotes: &['"', '\''],
        triple_quotes: &["\"\"\"", "'''"],
        raw_single_quotes: true,
        ..Syntax::PLAIN
    },
    indent: Indent::Nesting,
    delimiters: ",[]{}",
    operators: "=",
    preprocessor: false,
};

const SQL: Profile = Profile {
    syntax: Syntax {
        line_comments: &["--"],
        block_comment: Some(("/*", "*/")),
        quotes: &['"', '\''],
        multiline_quotes: &['"', '\''],
        raw_single_quotes: true,
        ..Syntax::PLAIN
    },
    indent: Indent::Nesting,
    delimiters: ",;()",
    operators: "",
    preprocessor: false,
};

const R: Profile = Profile {
    syntax: Syntax {
        line_comments: &["#"],
        quotes: &['"', '\''],
        multiline_quotes: &['"', '\''],
        ..Syntax::PLAIN
    },
    indent: Indent::Nesting,
    delimiters: C_DELIMITERS,
    operators: "",
    preprocessor: false,
};

const CSS: Profile = Profile {
    syntax: Syntax {
        block_comment: Some(("/*", "*/")),
        quotes: &['"', '\''],
        ..Syntax::PLAIN
    },
    indent: Indent::Nesting,
    delimiters: ",;{}",
    operators: "",
    preprocessor: false,
};

const SCSS: Profile = Profile {
    syntax: Syntax {
        line_comments: &["//"],
        doc_line_prefixes: &["///"],
        doc_block_prefixes: &["/**"],
        url_guard: true,
        ..CSS.syntax
    },
    ..CSS
};

// Indented syntax: nesting is the indentation itself
const SASS: Profile = Profile {
    delimiters: ",",
    ..SCSS
};

pub(crate) const JSON: Profile = Profile {
    syntax: Syntax {
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        quotes: &['"'],
        ..Syntax::PLAIN
    },
    indent: Indent::Nesting,
    delimiters: ",:[]{}",
    operators: "",
    preprocessor: false,
};

/// Returns the source profile for languages handled by the segment lexer.
pub(crate) fn source_profile(language: Language) -> Option<&'static Profile> {
    let profile = match language {
        Language::Python => &PYTHON,
        Language::JavaScript => &JAVASCRIPT,
        Language::TypeScript => &TYPESCRIPT,
        Language::Css => &CSS,
        Language::Scss => &SCSS,
        Language::Sass => &SASS,
        Language::Java => &JAVA,
        Language::C | Language::Cpp => &C,
        Language::Go => &GO,
        Language::Rust => &RUST,
        Language::Ruby => &RUBY,
        Language::Php => &PHP,
        Language::Swift => &SWIFT,
        Language::Kotlin => &KOTLIN,
        Language::Bash => &BASH,
        Language::Yaml => &YAML,
        Language::Toml => &TOML,
        Language::Sql => &SQL,
        Language::R => &R,
        Language::Dart => &DART,
        Language::Json => &JSON,
        Language::Html | Language::Xml | Language::Markdown | Language::Text => return None,
    };
    Some(profile)
}
