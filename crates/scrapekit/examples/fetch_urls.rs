//! Example: Fetch live pages and show which method produced each article
//!
//! Run with: cargo run -p scrapekit --example fetch_urls
//!
//! Hits the network; results depend on the sites and on which backends
//! are available locally.

use scrapekit::{FailureResponse, FetchRequest, FetchResult, ScrapeMethod, Tool};

/// Example case definition
struct Case {
    url: &'static str,
    description: &'static str,
    expect_method: Option<ScrapeMethod>,
    expect_contains: Option<&'static str>,
}

const CASES: &[Case] = &[
    Case {
        url: "https://httpbin.org/html",
        description: "Static article",
        expect_method: Some(ScrapeMethod::Baseline),
        expect_contains: Some("Herman Melville"),
    },
    Case {
        url: "https://example.com",
        description: "Short page (returned best-effort or rendered)",
        expect_method: None,
        expect_contains: Some("Example Domain"),
    },
    Case {
        url: "about:reader?url=https%3A%2F%2Fhttpbin.org%2Fhtml",
        description: "Reader-mode wrapped URL",
        expect_method: Some(ScrapeMethod::Baseline),
        expect_contains: Some("Moby"),
    },
];

#[tokio::main]
async fn main() {
    let tool = Tool::default();

    println!("ScrapeKit URL Examples");
    println!("======================");
    println!("Capabilities: {:?}\n", tool.capabilities());

    let mut passed = 0;
    let mut failed = 0;

    for (i, case) in CASES.iter().enumerate() {
        println!("{}. {}", i + 1, case.description);
        println!("   URL: {}", case.url);

        match tool.execute(FetchRequest::new(case.url)).await {
            Ok(result) => {
                print_summary(&result);
                if check_expectations(case, &result) {
                    println!("   ✓ PASS\n");
                    passed += 1;
                } else {
                    println!("   ✗ FAIL (expectations not met)\n");
                    failed += 1;
                }
            }
            Err(e) => {
                let failure = FailureResponse::from(&e);
                println!("   Error: {}", failure.error);
                println!("   Hint: {}", failure.hint);
                println!("   ✗ FAIL\n");
                failed += 1;
            }
        }
    }

    println!("======================");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}

fn print_summary(result: &FetchResult) {
    println!("   Title: {}", result.title);
    println!("   Method: {}", result.scrape_method);
    println!("   Words: {}", result.word_count);
    println!("   Domain: {}", result.source_domain);

    let preview = result.content_html.chars().take(100).collect::<String>();
    println!(
        "   Preview: {}{}",
        preview.replace('\n', " "),
        if result.content_html.len() > 100 { "..." } else { "" }
    );
}

fn check_expectations(case: &Case, result: &FetchResult) -> bool {
    if let Some(expected) = case.expect_method {
        if result.scrape_method != expected {
            println!(
                "   Expected method '{}', got '{}'",
                expected, result.scrape_method
            );
            return false;
        }
    }

    if let Some(expected_text) = case.expect_contains {
        let haystack = format!("{} {}", result.title, result.content_html);
        if !haystack.contains(expected_text) {
            println!("   Expected content to contain '{}'", expected_text);
            return false;
        }
    }

    true
}
