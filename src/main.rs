use clap::{Arg, Command};
use log::LevelFilter;
use phishgate::clipboard::{ClipboardMonitor, CommandClipboard, ScriptedClipboard};
use phishgate::interceptor::{InterceptionEngine, LogSurface};
use phishgate::messaging::MessageService;
use phishgate::policy::{PolicyAction, PolicyDecision};
use phishgate::Config;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() {
    let matches = Command::new("phishgate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Phishing interception engine for links, images, files, and clipboard text")
        .long_about(
            "PhishGate intercepts risky artifacts before they act:\n\
             • Links, images, and files are scanned by a scoring service\n\
             • Responses are normalized into red/yellow/green risk zones\n\
             • Red blocks, yellow warns, green passes through\n\
             • A clipboard monitor catches copied links between scans",
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/phishgate.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check-url")
                .long("check-url")
                .value_name("URL")
                .help("Scan a single URL and print the decision")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("check-file")
                .long("check-file")
                .value_name("FILE")
                .help("Scan a local file and print the decision")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("serve-stdio")
                .long("serve-stdio")
                .help("Answer JSON scan messages on stdin/stdout, one per line")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("demo")
                .long("demo")
                .help("Replay a scripted clipboard session with canned verdicts")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .help("Use canned verdicts instead of calling the scoring service")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging with per-event state transitions")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let config_path = matches.get_one::<String>("config").unwrap();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let mut config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("mock") {
        config.use_mock = true;
    }

    if matches.get_flag("test-config") {
        println!("🔍 Testing configuration: {config_path}");
        match config.validate() {
            Ok(()) => {
                println!("✅ Configuration is valid");
                println!("   Backend: {}", config.backend_url);
                if let Some(proxy) = &config.proxy_url {
                    println!("   Proxy: {proxy}");
                }
                println!("   Yellow threshold: {}", config.yellow_threshold);
                println!(
                    "   Clipboard monitoring: {}",
                    if config.clipboard.enabled {
                        "enabled"
                    } else {
                        "disabled"
                    }
                );
                println!(
                    "   Failure mode: {}",
                    if config.fail_closed {
                        "fail-closed"
                    } else {
                        "fail-open"
                    }
                );
            }
            Err(e) => {
                println!("❌ Configuration validation failed:");
                println!("Error: {e}");
                process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = config.validate() {
        eprintln!("Error in configuration: {e}");
        process::exit(1);
    }

    if let Some(url) = matches.get_one::<String>("check-url") {
        check_url(&config, url).await;
        return;
    }

    if let Some(file) = matches.get_one::<String>("check-file") {
        check_file(&config, file).await;
        return;
    }

    if matches.get_flag("demo") {
        run_demo(&config).await;
        return;
    }

    if matches.get_flag("serve-stdio") {
        serve_stdio(&config).await;
        return;
    }

    run_monitor(&config).await;
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn print_decision(decision: &PolicyDecision) {
    match decision.action {
        PolicyAction::Block => println!("❌ Result: BLOCK (zone: {})", decision.zone),
        PolicyAction::Warn => println!("⚠️  Result: WARN (zone: {})", decision.zone),
        PolicyAction::Allow => println!("✅ Result: ALLOW (zone: {})", decision.zone),
    }
    if let Some(message) = &decision.message {
        println!("   Message: {message}");
    }
}

async fn check_url(config: &Config, url: &str) {
    println!("🧪 Checking URL: {url}");
    println!();

    let engine = InterceptionEngine::new(config, Arc::new(LogSurface));
    let decision = engine.handle_link_click(url).await;
    print_decision(&decision);
}

async fn check_file(config: &Config, path: &str) {
    println!("🧪 Checking file: {path}");
    println!();

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("❌ Error reading file: {e}");
            process::exit(1);
        }
    };
    let name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());

    let engine = InterceptionEngine::new(config, Arc::new(LogSurface));
    let decision = engine.handle_file(bytes, name).await;
    print_decision(&decision);
}

async fn run_demo(config: &Config) {
    let mut demo_config = config.clone();
    demo_config.use_mock = true;

    let script = vec![
        "http://example.com/docs",
        "http://example.com/docs",
        "http://suspicious-test.example/offer",
        "meeting notes at 3pm",
        "http://phishing-test.example/login",
    ];

    println!(
        "🧪 Demo: replaying {} clipboard values through the monitor (canned verdicts)",
        script.len()
    );
    for value in &script {
        println!("   📋 {value}");
    }
    println!();

    let engine = Arc::new(InterceptionEngine::new(&demo_config, Arc::new(LogSurface)));
    let monitor = ClipboardMonitor::new(
        Arc::clone(&engine),
        Box::new(ScriptedClipboard::new(script)),
    );

    let mut handle = monitor.spawn(Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(500)).await;
    handle.shutdown();
    handle.join().await;

    println!();
    println!("📊 Demo session counters:");
    println!("{}", engine.stats().snapshot());
}

async fn serve_stdio(config: &Config) {
    let engine = Arc::new(InterceptionEngine::new(config, Arc::new(LogSurface)));
    let service = MessageService::new(engine);

    log::info!("message service ready: one JSON message per line on stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("stdin read failed: {e}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = service.handle_line(line).await;
        let framed = format!("{reply}\n");
        if let Err(e) = stdout.write_all(framed.as_bytes()).await {
            log::error!("stdout write failed: {e}");
            break;
        }
        if let Err(e) = stdout.flush().await {
            log::error!("stdout flush failed: {e}");
            break;
        }
    }

    log::info!("message service stopped");
}

async fn run_monitor(config: &Config) {
    log::info!("Starting PhishGate...");

    let engine = Arc::new(InterceptionEngine::new(config, Arc::new(LogSurface)));

    let handle = if config.clipboard.enabled {
        match CommandClipboard::detect() {
            Some(source) => {
                let monitor = ClipboardMonitor::new(Arc::clone(&engine), Box::new(source));
                Some(monitor.spawn(Duration::from_secs(config.clipboard.poll_interval_seconds)))
            }
            None => None,
        }
    } else {
        log::info!("clipboard monitoring disabled in configuration");
        None
    };

    if handle.is_none() {
        eprintln!("Nothing to monitor: clipboard is disabled or no clipboard tool was found.");
        eprintln!("Use --check-url, --check-file, --serve-stdio, or --demo instead.");
        process::exit(1);
    }

    log::info!("Press Ctrl+C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to wait for shutdown signal: {e}");
    }

    if let Some(mut handle) = handle {
        handle.shutdown();
        handle.join().await;
    }

    println!("📊 Session counters:");
    println!("{}", engine.stats().snapshot());
}
