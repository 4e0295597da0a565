//! JSON transform: layout cleanup at level 2, minification at level 3.

use super::lexer::{SegmentKind, lex};
use super::profile::JSON;
use super::source::{SourceOptimizer, strip_comments};
use super::{FallbackReason, LanguageOptimizer, OptimizationConfig, OptimizationLevel, Outcome};
use serde::de::IgnoredAny;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct JsonOptimizer;

impl JsonOptimizer {
    fn minify(content: &str, config: &OptimizationConfig) -> Result<String, FallbackReason> {
        let stripped = strip_comments(&lex(content, &JSON.syntax)?, config);

        let mut out = String::with_capacity(stripped.len());
        for segment in lex(&stripped, &JSON.syntax)? {
            match segment.kind {
                SegmentKind::Code => out.extend(segment.text.chars().filter(|c| !c.is_whitespace())),
                _ => out.push_str(segment.text),
            }
        }

        serde_json::from_str::<IgnoredAny>(&out).map_err(|_| FallbackReason::InvalidJson)?;
        Ok(out)
    }
}

impl LanguageOptimizer for JsonOptimizer {
    fn transform(&self, content: &str, config: &OptimizationConfig) -> Outcome {
        let result = if config.level >= OptimizationLevel::Aggressive {
            Self::minify(content, config)
        } else {
            SourceOptimizer::new(&JSON).apply(content, config)
        };
        result.map_or_else(Outcome::WhitespaceOnly, Outcome::Optimized)
    }
}
