// tests for routing queries to agents

mod common;

use agentrail::core::agent::CATALOGUE;
use agentrail::core::router::parse_reply;
use agentrail::{Agents, Classification, Domain, Guard, Orchestrator, PolicySet};
use agentrail::core::Unresolved;
use common::{Scripted, Step, reply};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn agents(script: &Arc<Scripted>) -> Agents {
    Agents::new(Arc::new(Guard::new(script.clone(), PolicySet::defaults()))).unwrap()
}

fn orchestrator(script: &Arc<Scripted>) -> Orchestrator {
    Orchestrator::new(script.clone()).with_timeout(Duration::from_millis(200))
}

#[tokio::test]
async fn test_nda_routes_to_legal() {
    let script = Scripted::new([reply("legal\nNon-disclosure agreements are contracts.")]);
    let agents = agents(&script);

    let query = "What is a non-disclosure agreement?";
    let result = orchestrator(&script).classify(query, agents.iter()).await;

    assert_eq!(
        result,
        Classification::Routed {
            domain: Domain::Legal,
            rationale: "Non-disclosure agreements are contracts.".to_string()
        }
    );

    // the prompt carries the query and every agent's description verbatim
    let calls = script.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1.contains(query));
    for spec in CATALOGUE {
        assert!(calls[0].1.contains(spec.description));
    }
}

#[tokio::test]
async fn test_garbled_reply_is_unknown() {
    let script = Scripted::new([reply("xyzzy")]);
    let agents = agents(&script);

    let result = orchestrator(&script).classify("hello?", agents.iter()).await;

    assert_eq!(
        result,
        Classification::Unknown(Unresolved::Unrecognized {
            reply: "xyzzy".to_string()
        })
    );
}

#[tokio::test]
async fn test_empty_reply_is_unknown() {
    let script = Scripted::new([reply("   ")]);
    let agents = agents(&script);

    let result = orchestrator(&script).classify("hello?", agents.iter()).await;
    assert_eq!(result.domain(), None);
}

#[tokio::test]
async fn test_failed_call_is_unknown() {
    let script = Scripted::new([Step::Fail]);
    let agents = agents(&script);

    let result = orchestrator(&script).classify("hello?", agents.iter()).await;
    assert_eq!(result, Classification::Unknown(Unresolved::Unavailable));
}

#[tokio::test]
async fn test_slow_call_is_unknown() {
    let script = Scripted::new([Step::Slow(Duration::from_secs(2), "legal".to_string())]);
    let agents = agents(&script);

    let result = orchestrator(&script).classify("hello?", agents.iter()).await;
    assert_eq!(result, Classification::Unknown(Unresolved::Unavailable));
}

#[tokio::test]
async fn test_only_registered_agents_are_offered() {
    let script = Scripted::new([reply("financial: bonds")]);
    let guard = Arc::new(Guard::new(script.clone(), PolicySet::defaults()));
    let specs = CATALOGUE.into_iter().filter(|s| s.domain != Domain::Financial);
    let agents = Agents::from_specs(specs, guard).unwrap();

    let result = orchestrator(&script).classify("What is a bond?", agents.iter()).await;

    assert_eq!(result.domain(), None);
    assert!(!script.calls()[0].1.contains("'financial'"));
}

#[test]
fn test_malformed_replies_never_route() {
    let replies = [
        "",
        "\n\n",
        "I think this is legal",
        "leg al",
        "legally speaking",
        "financial-legal",
        "💼 financial",
        "{\"domain\": \"legal\"}",
        "unknown",
    ];
    for r in replies {
        assert_eq!(parse_reply(r, &Domain::ALL).domain(), None, "{r:?}");
    }
}

#[test]
fn test_wrapped_keywords_route() {
    let cases = [
        ("Legal.", Domain::Legal),
        ("**financial** because money", Domain::Financial),
        ("\"general\" - history question", Domain::General),
        ("FINANCIAL", Domain::Financial),
    ];
    for (r, expected) in cases {
        assert_eq!(parse_reply(r, &Domain::ALL).domain(), Some(expected), "{r:?}");
    }
}

proptest! {
    #[test]
    fn prop_any_reply_decodes_to_known_domain_or_unknown(r in "\\PC*") {
        match parse_reply(&r, &Domain::ALL) {
            Classification::Routed { domain, .. } => prop_assert!(Domain::ALL.contains(&domain)),
            Classification::Unknown(_) => {}
        }
    }

    #[test]
    fn prop_keyword_first_routes_regardless_of_rest(idx in 0usize..3, rest in "[a-zA-Z ,.]{0,60}") {
        let domain = Domain::ALL[idx];
        let r = format!("{} {rest}", domain.keyword().to_uppercase());
        prop_assert_eq!(parse_reply(&r, &Domain::ALL).domain(), Some(domain));
    }
}
