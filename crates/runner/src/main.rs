use tollgate_order_manager::to_json_lines;
use tollgate_runner::{GatewayBootstrap, RunnerConfig, run_demo_session};

fn print_help() {
    eprintln!(
        r#"Tollgate - signal-to-order execution gateway

USAGE:
    tollgate [OPTIONS]

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --journal           Print the audit journal as JSON lines on exit
    --help              Print this help message

ENVIRONMENT VARIABLES:
    TOLLGATE_CONFIG             Configuration file (same as --config)
    TOLLGATE_LOCK_TIMEOUT_MS    Lock wait bound before failing closed (default: 250)
    TOLLGATE_MAX_POSITION       Default per-symbol position limit (default: 1000)
    TOLLGATE_CHANNEL_CAPACITY   Request queue depth (default: 1024)
    TOLLGATE_JOURNAL_PATH       Append the audit journal to this JSON-lines file
    RUST_LOG                    Log level filter
"#
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut print_journal = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(args[i].clone());
            }
            "--journal" => print_journal = true,
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path);
            let mut config = RunnerConfig::from_file(&path)?;
            config.apply_overrides(|var| std::env::var(var).ok())?;
            config
        }
        None => RunnerConfig::from_env()?,
    };

    let gateway = GatewayBootstrap::with_config(config)?;
    let report = run_demo_session(&gateway.client).await?;

    log::info!(
        "Session done: {} accepted, {} rejected",
        report.accepted,
        report.rejected
    );
    for position in &report.positions {
        log::info!(
            "  {:<6} qty {:>8} avg {:>8} realized {:>8}",
            position.symbol,
            position.quantity,
            position.avg_price,
            position.realized_pnl
        );
    }

    if print_journal {
        print!("{}", to_json_lines(&gateway.controller.journal().entries())?);
    }

    gateway.shutdown().await;
    Ok(())
}
