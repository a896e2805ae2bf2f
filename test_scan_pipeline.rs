use phishgate::clipboard::{ClipboardMonitor, ScriptedClipboard};
use phishgate::interceptor::{InterceptionEngine, LogSurface};
use phishgate::messaging::MessageService;
use phishgate::policy::PolicyAction;
use phishgate::Config;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Testing the full interception pipeline with canned verdicts...");

    let config_yaml = r#"
backend_url: "http://127.0.0.1:5000"
yellow_threshold: 0.3
use_mock: true
clipboard:
  enabled: true
  poll_interval_seconds: 2
"#;

    let config: Config = serde_yaml::from_str(config_yaml)?;
    config.validate()?;
    let engine = Arc::new(InterceptionEngine::new(&config, Arc::new(LogSurface)));

    let mut failures = 0;

    println!("\n=== Link clicks ===");
    let cases = [
        ("http://phishing-test.example/login", PolicyAction::Block),
        ("http://suspicious-test.example/offer", PolicyAction::Warn),
        ("http://example.com/docs", PolicyAction::Allow),
    ];

    for (url, expected) in &cases {
        let decision = engine.handle_link_click(*url).await;
        println!("URL: {url}");
        println!("  zone: {}, action: {:?}", decision.zone, decision.action);
        if let Some(message) = &decision.message {
            println!("  message: {message}");
        }
        if decision.action == *expected {
            println!("  ✅ expected {expected:?}");
        } else {
            println!("  ❌ expected {expected:?}, got {:?}", decision.action);
            failures += 1;
        }
    }

    println!("\n=== Image interception ===");
    let decision = engine
        .handle_image(vec![0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg")
        .await;
    println!(
        "JPEG bytes -> zone: {}, action: {:?}",
        decision.zone, decision.action
    );
    if decision.action == PolicyAction::Allow {
        println!("  ✅ benign image passes through");
    } else {
        println!("  ❌ benign image should be allowed");
        failures += 1;
    }

    println!("\n=== Messaging boundary ===");
    let service = MessageService::new(Arc::clone(&engine));
    let reply = service
        .handle_line(r#"{"type":"CHECK_PHISHING_URL","url":"http://phishing-test.example"}"#)
        .await;
    println!("reply: {reply}");
    if reply.contains(r#""success":true"#) && reply.contains(r#""phishing":true"#) {
        println!("  ✅ wire message answered with a phishing verdict");
    } else {
        println!("  ❌ unexpected reply shape");
        failures += 1;
    }

    println!("\n=== Clipboard dedup ===");
    let source = ScriptedClipboard::new(vec!["http://a.example", "http://a.example", "http://b.example"]);
    let mut monitor = ClipboardMonitor::new(Arc::clone(&engine), Box::new(source));
    let mut dispatched = Vec::new();
    for _ in 0..3 {
        dispatched.push(monitor.poll_once().await);
    }
    let scans = dispatched.iter().filter(|d| **d).count();
    println!("poll results: {dispatched:?}");
    if scans == 2 {
        println!("  ✅ duplicate clipboard value scanned once");
    } else {
        println!("  ❌ expected 2 scans, got {scans}");
        failures += 1;
    }

    // Give the spawned clipboard scans a moment to finish before reading
    // the session counters.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    println!("\n=== Session counters ===");
    println!("{}", engine.stats().snapshot());

    if failures > 0 {
        println!("\n❌ {failures} scenario(s) failed");
        std::process::exit(1);
    }
    println!("\n✅ All pipeline scenarios passed");
    Ok(())
}
