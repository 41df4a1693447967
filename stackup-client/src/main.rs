use clap::{Parser, Subcommand};
use stackup_config::{StackConfig, CONFIG_TEMPLATE, DEFAULT_CONFIG_FILE};
use stackup_core::{LaunchReport, ReadinessOutcome, ServiceStatus, StackupError};
use stackup_runner::launcher::{service_status, stop_stack};
use stackup_runner::{browser, StackLauncher, StateFile};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;

#[derive(Parser)]
#[command(name = "stackup")]
#[command(about = "Launch and manage a local assistant stack", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the stack config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch all services, open the browser, and wait
    Up {
        /// Skip the browser-open step
        #[arg(long)]
        no_browser: bool,

        /// Exit immediately instead of waiting for Enter
        #[arg(long)]
        no_wait: bool,
    },

    /// Stop everything the last `up` started
    Down,

    /// Show liveness of the recorded services
    Status,

    /// Generate a stackup.toml template
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Up { no_browser, no_wait } => {
            let config = load_config_or_exit(&cli.config);
            run_up(config, no_browser, no_wait).await?;
        }
        Commands::Down => {
            let config = load_config_or_exit(&cli.config);
            run_down(&config)?;
        }
        Commands::Status => {
            let config = load_config_or_exit(&cli.config);
            run_status(&config)?;
        }
        Commands::Init => {
            generate_config_template()?;
        }
    }

    Ok(())
}

fn load_config_or_exit(path: &str) -> StackConfig {
    match StackConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Run `stackup init` to generate a template.");
            process::exit(1);
        }
    }
}

async fn run_up(config: StackConfig, no_browser: bool, no_wait: bool) -> anyhow::Result<()> {
    let launcher = StackLauncher::new(config.clone());

    let report = match launcher.launch().await {
        Ok(report) => report,
        Err(e @ StackupError::DirectoryAccess { .. }) => {
            eprintln!("Error: {}", e);
            eprintln!("No services were started.");
            if !no_wait {
                wait_for_ack();
            }
            process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if !no_browser {
        if let Some(url) = &config.browser_url {
            browser::open(url);
        }
    }

    print_summary(&config, &report);

    if !no_wait {
        wait_for_ack();
    }
    Ok(())
}

fn run_down(config: &StackConfig) -> anyhow::Result<()> {
    let results = stop_stack(&config.project_root)?;
    if results.is_empty() {
        println!("Nothing to stop: no recorded launch found.");
        return Ok(());
    }

    let mut failures = 0;
    for (service, result) in &results {
        match result {
            Ok(()) => println!("✓ {} stopped", service),
            Err(e) => {
                failures += 1;
                eprintln!("✗ {} could not be stopped: {}", service, e);
            }
        }
    }

    if failures == 0 {
        println!("Stack is down.");
    } else {
        eprintln!("{} service(s) could not be stopped; state file kept.", failures);
        process::exit(1);
    }
    Ok(())
}

fn run_status(config: &StackConfig) -> anyhow::Result<()> {
    let state_file = StateFile::for_project(&config.project_root);
    if !state_file.exists() {
        println!("Stack is not running (no recorded launch).");
        return Ok(());
    }

    let state = state_file.load()?;
    println!("Launch {} started {}:\n", state.launch_id, state.started_at);
    for record in &state.records {
        println!(
            "  {} (pid {}) - {} - log: {}",
            record.service,
            record.pid,
            format_status(service_status(record)),
            record.log_file
        );
    }
    Ok(())
}

fn print_summary(config: &StackConfig, report: &LaunchReport) {
    println!("\nStack launched ({}):\n", report.launch_id);
    for outcome in &report.outcomes {
        let spec = config.services.iter().find(|s| s.name == outcome.service);
        let endpoint = spec
            .and_then(|s| s.endpoint())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} {} (pid {})",
            format_readiness(outcome.readiness),
            outcome.service,
            outcome.pid
        );
        println!("      endpoint: {}", endpoint);
        println!("      log:      {}", outcome.log_file);
    }
    if let Some(url) = &config.browser_url {
        println!("\nOpen {} in your browser if it did not open automatically.", url);
    }
    println!("\nServices keep running after this launcher exits.");
    println!("Stop them later with `stackup down`.");
}

fn format_readiness(outcome: ReadinessOutcome) -> &'static str {
    match outcome {
        ReadinessOutcome::Ready => "✓",
        ReadinessOutcome::TimedOut => "✗",
        ReadinessOutcome::NotProbed => "•",
    }
}

fn format_status(status: ServiceStatus) -> &'static str {
    match status {
        ServiceStatus::Running => "RUNNING",
        ServiceStatus::Stopped => "STOPPED",
        ServiceStatus::Unknown => "UNKNOWN",
    }
}

fn wait_for_ack() {
    print!("\nPress Enter to close this launcher...");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}

fn generate_config_template() -> anyhow::Result<()> {
    let path = DEFAULT_CONFIG_FILE;
    if Path::new(path).exists() {
        eprintln!("Error: {} already exists", path);
        eprintln!("Remove it first or edit it in place.");
        process::exit(1);
    }

    fs::write(path, CONFIG_TEMPLATE)?;
    println!("✓ Created config template at {}", path);
    println!("Edit project_root and the [[service]] entries, then run `stackup up`.");
    Ok(())
}
