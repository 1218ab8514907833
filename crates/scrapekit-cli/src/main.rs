//! ScrapeKit CLI - Command-line interface for article extraction

mod mcp;

use clap::{Parser, Subcommand, ValueEnum};
use scrapekit::{
    reading_time_minutes, FailureResponse, FetchRequest, FetchResult, Tool, TOOL_LLMTXT,
    WORDS_PER_MINUTE,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Output format for fetch subcommand
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Article HTML with YAML frontmatter
    #[default]
    Md,
    /// JSON format
    Json,
}

/// ScrapeKit - adaptive article fetching tool
#[derive(Parser, Debug)]
#[command(name = "scrapekit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print full help with examples (llmtxt)
    #[arg(long)]
    llmtxt: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as MCP (Model Context Protocol) server over stdio
    Mcp,
    /// Show which optional fetch backends are available
    Capabilities,
    /// Fetch URL and output the extracted article with metadata frontmatter
    Fetch {
        /// URL to fetch
        url: String,

        /// Output format
        #[arg(long, short, default_value = "md")]
        output: OutputFormat,

        /// Custom User-Agent
        #[arg(long)]
        user_agent: Option<String>,

        /// Word count below which a page escalates to the next method
        #[arg(long)]
        min_words: Option<usize>,

        /// Baseline HTTP timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Chrome or Chromium binary for headless rendering
        #[arg(long)]
        chrome: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    // Handle --llmtxt flag
    if cli.llmtxt {
        writeln_safe(TOOL_LLMTXT);
        std::process::exit(0);
    }

    match cli.command {
        Some(Commands::Mcp) => {
            mcp::run_server().await;
        }
        Some(Commands::Capabilities) => {
            let tool = Tool::default();
            print_json(&tool.capabilities());
        }
        Some(Commands::Fetch {
            url,
            output,
            user_agent,
            min_words,
            timeout,
            chrome,
        }) => {
            let mut builder = Tool::builder();
            if let Some(ua) = user_agent {
                builder = builder.user_agent(ua);
            }
            if let Some(n) = min_words {
                builder = builder.min_words(n);
            }
            if let Some(secs) = timeout {
                builder = builder.http_timeout(Duration::from_secs(secs));
            }
            if let Some(path) = chrome {
                builder = builder.chrome_executable(path);
            }

            run_fetch(&builder.build(), &url, output).await;
        }
        None => {
            eprintln!("Usage: scrapekit fetch <URL>");
            eprintln!("   or: scrapekit capabilities");
            eprintln!("   or: scrapekit mcp");
            eprintln!("   or: scrapekit --help");
            std::process::exit(1);
        }
    }
}

/// Log to stderr so stdout stays clean for output and MCP traffic
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run_fetch(tool: &Tool, url: &str, output: OutputFormat) {
    match tool.execute(FetchRequest::new(url)).await {
        Ok(result) => match output {
            OutputFormat::Md => writeln_safe(&format_md_with_frontmatter(&result)),
            OutputFormat::Json => print_json(&result),
        },
        Err(e) => {
            let failure = FailureResponse::from(&e);
            match output {
                OutputFormat::Md => {
                    eprintln!("Error: {}", failure.error);
                    eprintln!("Hint: {}", failure.hint);
                }
                OutputFormat::Json => print_json(&failure),
            }
            std::process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error serializing response: {}", e);
        std::process::exit(1);
    });
    writeln_safe(&json);
}

/// Format result as article HTML with YAML frontmatter
fn format_md_with_frontmatter(result: &FetchResult) -> String {
    let mut output = String::new();

    output.push_str("---\n");
    output.push_str(&format!("title: {}\n", yaml_string(&result.title)));
    output.push_str(&format!("source_domain: {}\n", result.source_domain));
    output.push_str(&format!("scrape_method: {}\n", result.scrape_method));
    output.push_str(&format!("word_count: {}\n", result.word_count));
    output.push_str(&format!(
        "reading_time_minutes: {}\n",
        reading_time_minutes(result.word_count, WORDS_PER_MINUTE)
    ));
    if let Some(ref lang) = result.language {
        output.push_str(&format!("language: {}\n", lang));
    }
    output.push_str("---\n");
    output.push_str(&result.content_html);

    output
}

/// Quote a frontmatter value; titles routinely contain `:` and `#`
fn yaml_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_default()
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
