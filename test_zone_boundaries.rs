use phishgate::artifact::Artifact;
use phishgate::policy::{PolicyAction, PolicyEnforcer};
use phishgate::verdict::{RawResponse, VerdictNormalizer};
use phishgate::zone::{Zone, ZoneClassifier};

fn main() {
    env_logger::init();

    println!("Testing zone classification across response edge cases...");

    let normalizer = VerdictNormalizer::new();
    let classifier = ZoneClassifier::new(0.3);
    let enforcer = PolicyEnforcer::new(false);

    let cases: Vec<(&str, RawResponse, Zone, PolicyAction)> = vec![
        (
            "confirmed phishing",
            RawResponse::Payload(r#"{"score":0.95,"phishing":true}"#.to_string()),
            Zone::Red,
            PolicyAction::Block,
        ),
        (
            "phishing flag with low score",
            RawResponse::Payload(r#"{"score":0.1,"phishing":true}"#.to_string()),
            Zone::Red,
            PolicyAction::Block,
        ),
        (
            "score exactly on the threshold",
            RawResponse::Payload(r#"{"score":0.3,"phishing":false}"#.to_string()),
            Zone::Green,
            PolicyAction::Allow,
        ),
        (
            "score just above the threshold",
            RawResponse::Payload(r#"{"score":0.31,"phishing":false}"#.to_string()),
            Zone::Yellow,
            PolicyAction::Warn,
        ),
        (
            "clean low score",
            RawResponse::Payload(r#"{"score":0.05,"phishing":false}"#.to_string()),
            Zone::Green,
            PolicyAction::Allow,
        ),
        (
            "empty JSON object",
            RawResponse::Payload("{}".to_string()),
            Zone::Green,
            PolicyAction::Allow,
        ),
        (
            "error page naming malware",
            RawResponse::Payload("Internal Server Error: possible malware detected".to_string()),
            Zone::Red,
            PolicyAction::Block,
        ),
        (
            "error page without keywords",
            RawResponse::Payload("503 Service Temporarily Unavailable".to_string()),
            Zone::Green,
            PolicyAction::Allow,
        ),
        (
            "service unreachable (fail-open)",
            RawResponse::Unavailable("connection refused".to_string()),
            Zone::Green,
            PolicyAction::Allow,
        ),
    ];

    let mut failures = 0;

    for (name, raw, expected_zone, expected_action) in &cases {
        let verdict = normalizer.normalize(raw);
        let zone = classifier.classify(&verdict);
        let decision = enforcer.decide(
            Artifact::url("http://example.com/case"),
            &verdict,
            zone,
        );

        let marker = match zone {
            Zone::Red => "🔴",
            Zone::Yellow => "🟡",
            Zone::Green => "🟢",
        };
        println!("\n{marker} {name}");
        println!(
            "  verdict: score={:?} phishing={} confidence={:?}",
            verdict.score, verdict.phishing, verdict.confidence
        );
        println!("  zone: {zone}, action: {:?}", decision.action);

        if zone == *expected_zone && decision.action == *expected_action {
            println!("  ✅ expected {expected_zone:?}/{expected_action:?}");
        } else {
            println!("  ❌ expected {expected_zone:?}/{expected_action:?}");
            failures += 1;
        }
    }

    println!("\n=== Fail-closed mode ===");
    let strict = PolicyEnforcer::new(true);
    let verdict = normalizer.normalize(&RawResponse::Unavailable("timed out".to_string()));
    let zone = classifier.classify(&verdict);
    let decision = strict.decide(Artifact::url("http://example.com"), &verdict, zone);
    println!(
        "unreachable service -> zone: {zone}, action: {:?}",
        decision.action
    );
    if decision.action == PolicyAction::Block {
        println!("  ✅ fail-closed holds the artifact");
    } else {
        println!("  ❌ fail-closed should block unavailable verdicts");
        failures += 1;
    }

    if failures > 0 {
        println!("\n❌ {failures} case(s) failed");
        std::process::exit(1);
    }
    println!("\n✅ All boundary cases passed");
}
