use clap::Parser;
use std::path::PathBuf;

use web_pilot::llm::Provider;
use web_pilot::runner::{RunConfig, RunProgress, run_test_with_progress};

/// Web Pilot - LLM-directed website testing
#[derive(Parser, Debug)]
#[command(
    name = "web-pilot",
    about = "Generate and execute website test plans with an LLM and a Playwright executor service",
    after_help = "ENVIRONMENT VARIABLES:\n\
        WEB_PILOT_EXECUTOR_URL   Executor service base URL\n\
        WEB_PILOT_OUTPUT_DIR     Directory for run artifacts\n\
        WEB_PILOT_TIMEOUT        Per-attempt execute timeout (seconds)\n\
        WEB_PILOT_MAX_RETRIES    Extra execute attempts after the first\n\
        WEB_PILOT_LLM_PROVIDER   LLM provider (anthropic or openai)\n\
        ANTHROPIC_API_KEY        Anthropic API key\n\
        OPENAI_API_KEY           OpenAI API key"
)]
struct Args {
    /// The URL to test
    url: String,

    /// Description of what to test
    description: String,

    /// Executor service base URL
    #[arg(long, env = "WEB_PILOT_EXECUTOR_URL", default_value = "http://localhost:8000")]
    executor_url: String,

    /// Directory for output files
    #[arg(short, long, env = "WEB_PILOT_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Per-attempt request timeout in seconds
    #[arg(long, env = "WEB_PILOT_TIMEOUT", default_value = "300.0")]
    timeout: f64,

    /// Maximum number of retry attempts
    #[arg(long, env = "WEB_PILOT_MAX_RETRIES", default_value = "1")]
    max_retries: u32,

    /// LLM provider to use (unrecognized values fall back to anthropic)
    #[arg(long, env = "WEB_PILOT_LLM_PROVIDER", default_value = "anthropic")]
    llm_provider: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = RunConfig::new(&args.url, &args.description)
        .executor_url(&args.executor_url)
        .output_dir(&args.output_dir)
        .timeout_secs(args.timeout)
        .max_retries(args.max_retries)
        .provider(Provider::from_selector(&args.llm_provider));

    let outcome = run_test_with_progress(&config, |progress| match progress {
        RunProgress::Fetching { url } => eprintln!("Fetching page source for {}", url),
        RunProgress::Generating => eprintln!("Generating test plan..."),
        RunProgress::PlanSaved { path } => eprintln!("Test plan saved to {}", path.display()),
        RunProgress::Executing => eprintln!("Executing test plan..."),
        RunProgress::Analyzing => eprintln!("Analyzing results..."),
        RunProgress::Complete => eprintln!("Run complete"),
    })
    .await;

    // Failures are reported in the printed envelope, not the exit code.
    let rendered = serde_json::to_string_pretty(&outcome)
        .unwrap_or_else(|err| format!("{{\"error\": \"Unexpected error: {}\"}}", err));
    println!("{}", rendered);
}
