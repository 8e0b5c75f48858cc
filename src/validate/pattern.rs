// src/validate/pattern.rs

use regex::{Regex, RegexBuilder};

use crate::exec::BoxFuture;
use crate::validate::{Evaluation, OutputCheck};

/// All-of regex matching over the full captured text.
///
/// Each pattern is compiled multi-line with `.` matching newlines; order does
/// not matter.
#[derive(Debug, Clone)]
pub struct PatternValidator {
    compiled: Vec<(String, Option<Regex>)>,
}

impl PatternValidator {
    pub fn new(patterns: &[String]) -> Self {
        let compiled = patterns
            .iter()
            .map(|p| {
                let re = RegexBuilder::new(p)
                    .multi_line(true)
                    .dot_matches_new_line(true)
                    .build()
                    .ok();
                (p.clone(), re)
            })
            .collect();
        Self { compiled }
    }

    /// Synchronous core of [`OutputCheck::evaluate`].
    pub fn evaluate_sync(&self, output: &str) -> Evaluation {
        let mut matched = Vec::new();
        let mut missing = Vec::new();
        for (pattern, re) in self.compiled.iter() {
            // An uncompilable pattern can never be satisfied.
            if re.as_ref().is_some_and(|re| re.is_match(output)) {
                matched.push(pattern.clone());
            } else {
                missing.push(pattern.clone());
            }
        }
        Evaluation {
            passed: missing.is_empty() && !self.compiled.is_empty(),
            missing,
            matched,
            rationale: None,
            error: None,
        }
    }
}

impl OutputCheck for PatternValidator {
    fn evaluate<'a>(&'a self, output: &'a str) -> BoxFuture<'a, Evaluation> {
        Box::pin(async move { self.evaluate_sync(output) })
    }
}
