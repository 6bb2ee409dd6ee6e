//! E2E test harness entry point
//!
//! This file is the test binary that runs the native and YAML suites against
//! a live OrangeHRM instance.
//! Run with: cargo test --package hrm-e2e --test e2e -- --live

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hrm_e2e::config::DEFAULT_CONFIG_FILE;
use hrm_e2e::report::write_reports;
use hrm_e2e::{
    suites, CdpBrowser, DriverFactory, E2eResult, LaunchOptions, Preflight, RunMode, RunnerConfig, SuiteConfig,
    SuitePolicy, TestRunner,
};

#[derive(Parser, Debug)]
#[command(name = "hrm-e2e")]
#[command(about = "E2E test runner for OrangeHRM")]
struct Args {
    /// Run only tests whose name or suite name contains this
    filter: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Drive a real browser; without it suites are only loaded and listed
    #[arg(long, env = "HRM_E2E_LIVE")]
    live: bool,

    /// Directory searched for declarative spec files
    #[arg(long)]
    spec_root: Option<PathBuf>,

    /// Run only tests carrying this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only tests whose name or suite name contains this
    #[arg(short, long)]
    name: Option<String>,

    /// Run mode: headless with retries, or headed without
    #[arg(long, value_enum, default_value_t = RunMode::Run)]
    mode: RunMode,

    /// Base URL of the application under test
    #[arg(long)]
    base_url: Option<String>,

    /// Show the browser window even in run mode
    #[arg(long)]
    headed: bool,

    /// Skip the reachability check
    #[arg(long)]
    skip_preflight: bool,

    /// Output directory for results
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(async_main(args));

    match result {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let mut config = SuiteConfig::load(&args.config)?.with_env_overrides();
    if let Some(url) = args.base_url {
        config.base_url = url;
    }
    if let Some(root) = args.spec_root {
        config.spec_root = root;
    } else if !config.spec_root.exists() {
        config.spec_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("specs");
    }
    if let Some(output) = args.output {
        config.screenshots_dir = output.join("screenshots");
        config.reports_dir = output;
    }

    config.validate()?;

    let all = suites::load(&config)?;
    if !args.live {
        let tests: usize = all.iter().map(|s| s.cases.len()).sum();
        for suite in &all {
            info!("{} ({} test(s))", suite.name, suite.cases.len());
        }
        info!("Loaded {} suite(s), {} test(s); pass --live to run them", all.len(), tests);
        return Ok(true);
    }

    if !args.skip_preflight {
        Preflight::from_config(&config).check().await?;
    }

    let mut launch = LaunchOptions::from_config(&config, args.mode);
    if args.headed {
        launch.headless = false;
    }
    let browser = Arc::new(CdpBrowser::launch(launch).await?);

    let options = RunnerConfig {
        mode: args.mode,
        tag: args.tag,
        name_filter: args.name.or(args.filter),
    };
    let reports_dir = config.reports_dir.clone();
    let runner = TestRunner::new(config, browser.clone(), SuitePolicy::standard()?, options);

    let outcome = runner.run(&all).await;
    if let Err(e) = browser.shutdown().await {
        error!("Browser shutdown failed: {}", e);
    }
    let results = outcome?;

    write_reports(&results, &reports_dir)?;
    Ok(results.success())
}
