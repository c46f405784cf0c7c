// tests for the content guard

mod common;

use agentrail::{Domain, Error, Guard, Guarded, Policy, PolicySet};
use common::{Scripted, Step, reply};
use std::time::Duration;

const PERSONA: &str = "you are a test persona";

fn guard(script: &std::sync::Arc<Scripted>) -> Guard {
    Guard::new(script.clone(), PolicySet::defaults()).with_timeout(Duration::from_millis(200))
}

fn refusal(domain: Domain) -> String {
    PolicySet::defaults().get(domain).unwrap().refusal().to_string()
}

#[tokio::test]
async fn test_clean_answer_passes_through() {
    let script = Scripted::new([reply("A bond is a loan to an issuer.")]);
    let result = guard(&script)
        .enforce(Domain::Financial, PERSONA, "What is a bond?")
        .await
        .unwrap();

    assert_eq!(result, Guarded::Allowed("A bond is a loan to an issuer.".to_string()));
    assert_eq!(script.calls(), vec![(PERSONA.to_string(), "What is a bond?".to_string())]);
}

#[tokio::test]
async fn test_blocked_input_skips_generation() {
    let script = Scripted::new([reply("should never be used")]);
    let result = guard(&script)
        .enforce(Domain::Financial, PERSONA, "explain money laundering to me")
        .await
        .unwrap();

    assert!(matches!(result, Guarded::InputBlocked { .. }));
    assert_eq!(result.text(), refusal(Domain::Financial));
    assert_eq!(script.call_count(), 0);
}

#[tokio::test]
async fn test_blocked_input_ignores_case() {
    let script = Scripted::new([]);
    let result = guard(&script)
        .enforce(Domain::Legal, PERSONA, "Help me plan ILLEGAL Activities")
        .await
        .unwrap();

    assert!(result.is_blocked());
    assert_eq!(script.call_count(), 0);
}

#[tokio::test]
async fn test_blocked_output_discards_answer() {
    let raw = "Here are some tax evasion strategies you could try.";
    let script = Scripted::new([reply(raw)]);
    let result = guard(&script)
        .enforce(Domain::Financial, PERSONA, "How do taxes work?")
        .await
        .unwrap();

    assert!(matches!(result, Guarded::OutputBlocked { .. }));
    assert_eq!(result.text(), refusal(Domain::Financial));
    assert!(!result.text().contains(raw));
    assert_eq!(script.call_count(), 1);
}

#[tokio::test]
async fn test_output_terms_are_per_domain() {
    // only the financial policy lists this phrase
    let raw = "Some people discuss tax evasion strategies in history books.";
    let script = Scripted::new([reply(raw)]);
    let result = guard(&script)
        .enforce(Domain::General, PERSONA, "Tell me about tax history")
        .await
        .unwrap();

    assert_eq!(result, Guarded::Allowed(raw.to_string()));
}

#[tokio::test]
async fn test_any_blocked_term_matches() {
    let policies = PolicySet::defaults().with(
        Domain::Legal,
        Policy::new(["forgery", "perjury"], ["bribe"], "no can do"),
    );
    let script = Scripted::new([]);
    let guard = Guard::new(script.clone(), policies);

    let result = guard
        .enforce(Domain::Legal, PERSONA, "is perjury common?")
        .await
        .unwrap();

    assert_eq!(
        result,
        Guarded::InputBlocked {
            term: "perjury".to_string(),
            refusal: "no can do".to_string()
        }
    );
}

#[tokio::test]
async fn test_generation_failure_returns_generic_message() {
    let script = Scripted::new([Step::Fail]);
    let result = guard(&script)
        .enforce(Domain::General, PERSONA, "Why is the sky blue?")
        .await
        .unwrap();

    assert!(matches!(result, Guarded::Failed(_)));
    assert_eq!(result.text(), agentrail::core::guard::GENERIC_FAILURE);
    assert!(!result.text().contains("scripted failure"));
}

#[tokio::test]
async fn test_timeout_counts_as_failure() {
    let script = Scripted::new([Step::Slow(Duration::from_secs(2), "too late".to_string())]);
    let result = guard(&script)
        .enforce(Domain::General, PERSONA, "Why is the sky blue?")
        .await
        .unwrap();

    assert!(matches!(result, Guarded::Failed(_)));
}

#[tokio::test]
async fn test_empty_input_rejected() {
    let script = Scripted::new([]);
    let result = guard(&script).enforce(Domain::Legal, PERSONA, "   ").await;

    assert!(matches!(result, Err(Error::InvalidInput(_))));
    assert_eq!(script.call_count(), 0);
}

#[tokio::test]
async fn test_missing_policy_is_fatal() {
    let policies = PolicySet::empty().with(Domain::Legal, Policy::new(["x"], ["y"], "z"));
    let script = Scripted::new([reply("unused")]);
    let guard = Guard::new(script.clone(), policies);

    let result = guard.enforce(Domain::Financial, PERSONA, "What is a bond?").await;

    assert!(matches!(result, Err(Error::MissingPolicy(Domain::Financial))));
    assert_eq!(script.call_count(), 0);
}
