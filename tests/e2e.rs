//! End-to-end integration tests for edgequake-summarize.
//!
//! These tests make live LLM API calls against whatever provider the
//! environment configures (`OPENAI_API_KEY`, `EDGEQUAKE_LLM_PROVIDER` +
//! `EDGEQUAKE_MODEL`, …). They are gated behind the `E2E_ENABLED`
//! environment variable so they do not run in CI unless explicitly requested.
//! Fixtures are generated into temp directories, nothing is downloaded.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_long_summary -- --nocapture

use edgequake_summarize::{
    summarize, summarize_file, summarize_sync, summarize_to_file, SummarizeError, SummaryConfig,
    SummaryOutput, SummaryTier,
};
use std::io::Write;
use std::path::{Path, PathBuf};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("target/e2e-output");
    std::fs::create_dir_all(&d).ok();
    d
}

fn e2e_config() -> SummaryConfig {
    SummaryConfig::builder()
        .max_retries(2)
        .build()
        .expect("valid config")
}

/// A ~4 500 character quarterly report with page furniture an extractor
/// would leave behind.
fn sample_report() -> String {
    let mut text = String::new();
    let sections = [
        (
            "Revenue",
            "Northwind Logistics closed the third quarter with revenue of 48.2 million euros, \
             up 12 percent year over year. Growth came mainly from the cold-chain segment, \
             which added three pharmaceutical customers in Rotterdam and Hamburg. Freight \
             brokerage revenue was flat because spot rates fell through August.",
        ),
        (
            "Costs",
            "Operating costs rose 7 percent to 41.0 million euros. Fuel costs declined after \
             the fleet renewal programme replaced 140 diesel tractors with LNG units, but \
             warehouse wages increased after the new collective agreement took effect in July. \
             Depreciation grew with the two new cross-dock facilities.",
        ),
        (
            "Operations",
            "On-time delivery improved from 91.4 to 94.8 percent. The routing system rolled out \
             in the second quarter reduced empty kilometres by 9 percent. The Lyon depot suffered \
             a four-day outage after a flood in September, which delayed about 1 200 shipments; \
             insurance is expected to cover most of the loss.",
        ),
        (
            "Outlook",
            "Management raised full-year revenue guidance to 190 million euros and expects margin \
             expansion in the fourth quarter as the LNG fleet reaches full utilisation. The board \
             approved a 15 million euro investment in an automated sorting centre near Antwerp, \
             due to open in the second half of next year.",
        ),
    ];
    for (page, (heading, body)) in sections.iter().enumerate() {
        text.push_str("NORTHWIND LOGISTICS — CONFIDENTIAL\n\n");
        text.push_str(&format!("{heading}\n\n{body}\n\n{body}\n\n"));
        text.push_str(&format!("Page {} of {}\n\n", page + 1, sections.len()));
    }
    text
}

/// Write a minimal DOCX whose paragraphs are `paragraphs`.
fn write_docx(path: &Path, paragraphs: &[&str]) {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{p}</w:t></w:r></w:p>"))
        .collect();
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}</w:body></w:document>"
    );

    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(document.as_bytes()).unwrap();
    zip.finish().unwrap();
}

/// Assert the summary passes basic quality checks.
fn assert_summary_quality(output: &SummaryOutput, context: &str) {
    let summary = &output.summary;

    // Must be non-empty
    assert!(!summary.trim().is_empty(), "[{context}] Summary is empty");

    // Fences and surrounding whitespace are stripped by the post-processor
    assert_eq!(summary.trim(), summary, "[{context}] Summary is not trimmed");
    let first_line = summary.lines().next().unwrap_or("");
    assert!(
        !first_line.starts_with("```"),
        "[{context}] Output must not start with a code fence, got: {first_line:?}"
    );
    assert!(
        !summary.contains("\n\n\n"),
        "[{context}] Output has more than one consecutive blank line"
    );

    // A summary is shorter than what it summarizes
    assert!(
        output.output_length < output.input_length,
        "[{context}] Summary ({}) not shorter than input ({})",
        output.output_length,
        output.input_length
    );
    assert_eq!(output.output_length, summary.chars().count());

    // One normalizer call, at least one chunk call, one synthesis call
    assert!(output.stats.chunk_count >= 1);
    assert!(
        output.stats.completion_calls >= output.stats.chunk_count + 2,
        "[{context}] Expected at least {} calls, got {}",
        output.stats.chunk_count + 2,
        output.stats.completion_calls
    );

    println!(
        "[{context}] ✓  {} → {} chars, {} chunks, {} calls, quality checks passed",
        output.input_length,
        output.output_length,
        output.stats.chunk_count,
        output.stats.completion_calls
    );
}

fn save(output: &SummaryOutput, name: &str) {
    let out_path = output_dir().join(name);
    std::fs::write(&out_path, &output.summary).ok();
    println!("[{name}] Saved to {}", out_path.display());
    println!("--- BEGIN OUTPUT ---\n{}\n--- END OUTPUT ---", output.summary);
}

// ── Summary quality tests (need LLM API) ────────────────────────────────────

/// Short tier: executive bullet points.
#[tokio::test]
async fn test_short_summary_is_bullets() {
    e2e_skip_unless_ready!();

    let output = summarize(&sample_report(), SummaryTier::Short, &e2e_config())
        .await
        .expect("summary should succeed");

    assert_summary_quality(&output, "short");
    let bullets = output
        .summary
        .lines()
        .filter(|l| {
            let l = l.trim_start();
            l.starts_with("- ") || l.starts_with("* ") || l.starts_with("• ")
        })
        .count();
    assert!(bullets >= 3, "[short] Expected bullet points, got {bullets}");

    // The key figure should survive normalisation and chunking
    assert!(
        output.summary.contains("48.2") || output.summary.to_lowercase().contains("revenue"),
        "[short] Summary should mention revenue"
    );
    save(&output, "short.md");
}

/// Medium tier: prose, no headings.
#[tokio::test]
async fn test_medium_summary_is_prose() {
    e2e_skip_unless_ready!();

    let output = summarize(&sample_report(), SummaryTier::Medium, &e2e_config())
        .await
        .expect("summary should succeed");

    assert_summary_quality(&output, "medium");
    let words = output.summary.split_whitespace().count();
    assert!(
        (80..=450).contains(&words),
        "[medium] Expected roughly 180–250 words, got {words}"
    );
    save(&output, "medium.md");
}

/// Long tier: headed sections.
#[tokio::test]
async fn test_long_summary_has_sections() {
    e2e_skip_unless_ready!();

    let output = summarize(&sample_report(), SummaryTier::Long, &e2e_config())
        .await
        .expect("summary should succeed");

    assert_summary_quality(&output, "long");
    let lower = output.summary.to_lowercase();
    assert!(
        lower.contains("introduction") && lower.contains("conclusion"),
        "[long] Expected Introduction and Conclusion sections"
    );

    // Page furniture must not leak into the summary
    assert!(!output.summary.contains("Page 2 of 4"));
    save(&output, "long.md");
}

/// Small chunks force a multi-chunk fan-out on a modest document.
#[tokio::test]
async fn test_multi_chunk_fan_out() {
    e2e_skip_unless_ready!();

    let config = SummaryConfig::builder()
        .chunk_size(800)
        .chunk_overlap(80)
        .concurrency(3)
        .max_retries(2)
        .build()
        .unwrap();

    let output = summarize(&sample_report(), SummaryTier::Medium, &config)
        .await
        .expect("summary should succeed");

    assert!(
        output.stats.chunk_count > 1,
        "Expected several chunks, got {}",
        output.stats.chunk_count
    );
    assert!(output.stats.total_input_tokens > 0, "Should have consumed tokens");
    assert_summary_quality(&output, "fan_out");
}

/// DOCX input through the extraction path.
#[tokio::test]
async fn test_summarize_docx_file() {
    e2e_skip_unless_ready!();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.docx");
    let report = sample_report();
    let paragraphs: Vec<&str> = report.split("\n\n").filter(|p| !p.trim().is_empty()).collect();
    write_docx(&path, &paragraphs);

    let output = summarize_file(path.to_str().unwrap(), SummaryTier::Short, &e2e_config())
        .await
        .expect("docx summary should succeed");

    assert_summary_quality(&output, "docx");
}

/// Output file is written atomically with a trailing newline.
#[tokio::test]
async fn test_summarize_to_file() {
    e2e_skip_unless_ready!();

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("report.txt");
    std::fs::write(&input, sample_report()).unwrap();
    let out_path = dir.path().join("out").join("summary.md");

    let output = summarize_to_file(input.to_str().unwrap(), SummaryTier::Medium, &out_path, &e2e_config())
        .await
        .expect("summary should succeed");

    let written = std::fs::read_to_string(&out_path).expect("output file exists");
    assert_eq!(written, format!("{}\n", output.summary));
}

/// JSON form used by the CLI's `--json` flag.
#[tokio::test]
async fn test_output_json_serialisable() {
    e2e_skip_unless_ready!();

    let output = summarize(&sample_report(), SummaryTier::Short, &e2e_config())
        .await
        .expect("summary should succeed");

    let json = serde_json::to_value(&output).expect("output serialises");
    assert_eq!(json["tier"], "short");
    assert_eq!(json["summary"], output.summary.as_str());
    assert!(json["stats"]["completion_calls"].as_u64().unwrap() >= 3);
}

/// The blocking wrapper owns its runtime, so it must run outside tokio.
#[test]
fn test_summarize_sync() {
    e2e_skip_unless_ready!();

    let output = summarize_sync(&sample_report(), SummaryTier::Short, &e2e_config())
        .expect("summary should succeed");
    assert_summary_quality(&output, "sync");
}

// ── Ollama provider e2e tests ───────────────────────────────────────────────

/// Helper: check if Ollama is reachable at the configured host.
async fn ollama_is_available() -> bool {
    let host =
        std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".to_string());
    reqwest::Client::new()
        .get(format!("{host}/api/tags"))
        .timeout(std::time::Duration::from_secs(3))
        .send()
        .await
        .is_ok()
}

/// Gated e2e: summarize with a local Ollama model.
///
/// Requirements:
/// - `E2E_ENABLED=1`
/// - Ollama running at `OLLAMA_HOST` (default: http://localhost:11434)
/// - A chat model pulled: set `OLLAMA_MODEL` (defaults to `llama3.2`).
///
/// Run:
///   E2E_ENABLED=1 OLLAMA_MODEL=llama3.2 cargo test --test e2e test_ollama_summary -- --nocapture
#[tokio::test]
async fn test_ollama_summary() {
    e2e_skip_unless_ready!();
    if !ollama_is_available().await {
        println!("SKIP — Ollama not reachable");
        return;
    }

    let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
    let config = SummaryConfig::builder()
        .provider_name("ollama")
        .model(model.as_str())
        .api_timeout_secs(180)
        .build()
        .unwrap();

    let output = summarize(&sample_report(), SummaryTier::Short, &config)
        .await
        .expect("ollama summary should succeed");
    assert_summary_quality(&output, &format!("ollama/{model}"));
}

// ── Error-path tests (no LLM calls, always run) ─────────────────────────────

#[tokio::test]
async fn test_missing_file_is_reported_before_any_call() {
    let err = summarize_file("/definitely/not/here.pdf", SummaryTier::Short, &SummaryConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SummarizeError::FileNotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_blank_document_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.txt");
    std::fs::write(&path, "   \n\n  \t ").unwrap();

    let config = SummaryConfig::builder()
        .provider_name("definitely-not-a-provider")
        .build()
        .unwrap();
    let err = summarize_file(path.to_str().unwrap(), SummaryTier::Medium, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, SummarizeError::InvalidInput { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_unknown_provider_is_not_configured() {
    let config = SummaryConfig::builder()
        .provider_name("definitely-not-a-provider")
        .build()
        .unwrap();
    let err = summarize(&sample_report(), SummaryTier::Medium, &config)
        .await
        .unwrap_err();
    assert!(
        matches!(err, SummarizeError::ProviderNotConfigured { .. }),
        "got {err:?}"
    );
}

// ── Callback API unit tests (no LLM calls, always run) ───────────────────────

/// `SummaryProgressCallback` can be boxed as `Arc<dyn …>` and moved into a
/// `tokio::spawn` task, with the error string moved in alongside it.
#[tokio::test]
async fn test_callback_send_in_tokio_spawn() {
    use edgequake_summarize::SummaryProgressCallback;
    use std::sync::{Arc, Mutex};

    struct ErrorLogger {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl SummaryProgressCallback for ErrorLogger {
        fn on_chunk_error(&self, _index: usize, _total: usize, error: String) {
            self.log.lock().unwrap().push(error);
        }
    }

    let logger = Arc::new(ErrorLogger {
        log: Arc::new(Mutex::new(vec![])),
    });
    let log_ref = Arc::clone(&logger.log);

    let cb: Arc<dyn SummaryProgressCallback> =
        Arc::clone(&logger) as Arc<dyn SummaryProgressCallback>;

    tokio::spawn(async move {
        cb.on_chunk_error(2, 5, "timeout after 3 retries".to_string());
    })
    .await
    .expect("spawn must succeed");

    let captured = log_ref.lock().unwrap().clone();
    assert_eq!(captured, vec!["timeout after 3 retries"]);
}

/// Verify that a Noop callback compiles and does not panic.
#[test]
fn test_noop_callback_is_send_sync() {
    use edgequake_summarize::{NoopProgressCallback, SummaryProgressCallback};
    use std::sync::Arc;

    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<NoopProgressCallback>();

    let cb: Arc<dyn SummaryProgressCallback> = Arc::new(NoopProgressCallback);
    cb.on_chunk_error(1, 1, "an error".to_string());
}
