// tests/output_validator.rs

use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use launchcheck::exec::BoxFuture;
use launchcheck::types::{FailureKind, Verdict};
use launchcheck::validate::{
    CheckRequest, CheckerVerdict, ExternalChecker, OutputValidator, PatternValidator,
    ValidationReport,
};
use launchcheck_test_utils::builders::UnitDescriptorBuilder;

/// Checker that answers with a fixed verdict and remembers what it saw.
struct ScriptedChecker {
    answer: Result<CheckerVerdict, String>,
    seen: Mutex<Vec<CheckRequest>>,
}

impl ScriptedChecker {
    fn new(answer: Result<CheckerVerdict, String>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            seen: Mutex::new(Vec::new()),
        })
    }
}

impl ExternalChecker for ScriptedChecker {
    fn check(&self, request: CheckRequest) -> BoxFuture<'_, Result<CheckerVerdict, String>> {
        self.seen.lock().unwrap().push(request);
        let answer = self.answer.clone();
        Box::pin(async move { answer })
    }
}

#[test]
fn all_patterns_must_match_in_any_order() {
    let patterns = vec!["READY".to_string(), "Started .* in".to_string()];
    let validator = PatternValidator::new(&patterns);

    let eval = validator.evaluate_sync("Started DemoApp in 2.1 seconds\nserver READY\n");
    assert!(eval.passed);
    assert!(eval.missing.is_empty());

    let eval = validator.evaluate_sync("Started DemoApp in 2.1 seconds\n");
    assert!(!eval.passed);
    assert_eq!(eval.missing, vec!["READY"]);
    assert_eq!(eval.matched, vec!["Started .* in"]);
}

#[test]
fn patterns_span_lines_and_anchor_per_line() {
    let patterns = vec!["BEGIN.*END".to_string(), "^total: \\d+$".to_string()];
    let validator = PatternValidator::new(&patterns);

    let eval = validator.evaluate_sync("BEGIN\nmiddle\nEND\ntotal: 42\ndone\n");
    assert!(eval.passed, "missing: {:?}", eval.missing);
}

#[test]
fn clean_exit_and_all_patterns_is_pass() {
    let report = ValidationReport::combine(
        Some(0),
        PatternValidator::new(&["OK".to_string()]).evaluate_sync("all OK"),
    );
    assert!(report.passed());
    assert_eq!(report.failure(), None);
}

#[test]
fn clean_exit_with_missing_pattern_is_validation_failure() {
    let report = ValidationReport::combine(
        Some(0),
        PatternValidator::new(&["OK".to_string(), "DONE".to_string()]).evaluate_sync("all OK"),
    );
    assert!(!report.passed());
    assert_eq!(
        report.failure(),
        Some(FailureKind::ValidationFailed {
            missing: vec!["DONE".to_string()],
            rationale: None,
        })
    );
}

#[test]
fn non_zero_exit_fails_even_when_patterns_match() {
    let report = ValidationReport::combine(
        Some(1),
        PatternValidator::new(&["OK".to_string()]).evaluate_sync("OK OK OK"),
    );
    assert!(report.patterns_ok);
    assert!(!report.exit_ok);
    let failure = report.failure().expect("must fail");
    assert_eq!(failure.verdict(), Verdict::Fail);
    assert!(matches!(failure, FailureKind::ExecutionFailed { exit_code: Some(1), .. }));
}

#[tokio::test]
async fn external_mode_uses_checker_verdict() {
    let checker = ScriptedChecker::new(Ok(CheckerVerdict {
        pass: false,
        rationale: "no primes listed".to_string(),
    }));
    let validator = OutputValidator::new(Some(checker.clone() as Arc<dyn ExternalChecker>));
    let unit = UnitDescriptorBuilder::new("agents/primes")
        .external("Lists three prime numbers")
        .build();

    let report = validator.validate(&unit, Some(0), "1, 4, 9").await;
    assert!(!report.passed());
    assert_eq!(
        report.failure(),
        Some(FailureKind::ValidationFailed {
            missing: Vec::new(),
            rationale: Some("no primes listed".to_string()),
        })
    );

    let seen = checker.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].unit_id, "agents/primes");
    assert_eq!(seen[0].prompt, "Lists three prime numbers");
    assert_eq!(seen[0].output, "1, 4, 9");
}

#[tokio::test]
async fn external_mode_still_requires_clean_exit() {
    let checker = ScriptedChecker::new(Ok(CheckerVerdict {
        pass: true,
        rationale: String::new(),
    }));
    let validator = OutputValidator::new(Some(checker as Arc<dyn ExternalChecker>));
    let unit = UnitDescriptorBuilder::new("u").external("anything").build();

    assert!(validator.validate(&unit, Some(0), "x").await.passed());
    assert!(!validator.validate(&unit, Some(2), "x").await.passed());
    assert!(!validator.validate(&unit, None, "x").await.passed());
}

#[tokio::test]
async fn checker_error_is_a_distinct_failure() {
    let checker = ScriptedChecker::new(Err("checker timed out after 120s".to_string()));
    let validator = OutputValidator::new(Some(checker as Arc<dyn ExternalChecker>));
    let unit = UnitDescriptorBuilder::new("u").external("anything").build();

    let report = validator.validate(&unit, Some(0), "x").await;
    assert_eq!(
        report.failure(),
        Some(FailureKind::CheckerError {
            reason: "checker timed out after 120s".to_string()
        })
    );
}

#[tokio::test]
async fn external_mode_without_checker_fails() {
    let validator = OutputValidator::new(None);
    let unit = UnitDescriptorBuilder::new("u").external("anything").build();

    let failure = validator.validate(&unit, Some(0), "x").await.failure();
    assert!(
        matches!(&failure, Some(FailureKind::CheckerError { reason }) if reason.contains("no external checker")),
        "got {failure:?}"
    );
}

proptest! {
    #[test]
    fn non_zero_exit_is_never_pass(
        code in prop_oneof![i32::MIN..0, 1..=i32::MAX],
        output in ".{0,200}",
        include_patterns in any::<bool>(),
    ) {
        let patterns = vec!["OK".to_string()];
        let text = if include_patterns { format!("{output}\nOK\n") } else { output };
        let report = ValidationReport::combine(
            Some(code),
            PatternValidator::new(&patterns).evaluate_sync(&text),
        );
        prop_assert!(!report.passed());
        prop_assert!(report.failure().is_some_and(|f| f.verdict() != Verdict::Pass));
    }

    #[test]
    fn clean_exit_with_every_pattern_is_pass(
        words in proptest::collection::vec("[a-z]{3,8}", 1..6),
        noise in "[ -~]{0,80}",
    ) {
        let patterns: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
        let mut text = noise;
        for w in words.iter().rev() {
            text.push('\n');
            text.push_str(w);
        }
        let report = ValidationReport::combine(
            Some(0),
            PatternValidator::new(&patterns).evaluate_sync(&text),
        );
        prop_assert!(report.passed());
    }
}
