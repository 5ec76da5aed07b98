//! Input resolution and text extraction.
//!
//! A user-supplied path or URL is first resolved to a local file (URLs are
//! downloaded into a `TempDir` that lives as long as the [`ResolvedInput`]),
//! then its text is pulled out according to the file extension:
//!
//! | Extension     | Extraction |
//! |---------------|------------|
//! | `pdf`         | embedded text layer via `pdf-extract`, pages joined by `\n` |
//! | `docx`        | `<w:t>` runs of `word/document.xml`, one line per paragraph |
//! | `pptx`        | `<a:t>` runs of every `ppt/slides/slideN.xml`, in slide order |
//! | `txt`, `md`   | read as UTF-8, invalid sequences replaced |
//!
//! Parsing is CPU-bound and synchronous, so [`extract_text`] runs it inside
//! `spawn_blocking`.

use crate::error::SummarizeError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Document formats text can be extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Pptx,
    PlainText,
}

impl DocumentFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, SummarizeError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "pptx" => Ok(DocumentFormat::Pptx),
            "txt" | "md" => Ok(DocumentFormat::PlainText),
            _ => Err(SummarizeError::UnsupportedFormat { extension }),
        }
    }
}

/// The resolved input — either a local path or a downloaded temp file.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the document was downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until extraction completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Strip surrounding whitespace and quotes, as left behind by drag-and-drop
/// or copy-pasted shell paths.
pub fn clean_path_input(input: &str) -> &str {
    input.trim().trim_matches(|c| c == '"' || c == '\'')
}

/// Resolve the input string to a readable local file.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, SummarizeError> {
    let input = clean_path_input(input);
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, SummarizeError> {
    let path = PathBuf::from(path_str);

    if !path.is_file() {
        return Err(SummarizeError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SummarizeError::PermissionDenied { path });
        }
        Err(_) => return Err(SummarizeError::FileNotFound { path }),
    }

    DocumentFormat::from_path(&path)?;

    debug!("Resolved local document: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, SummarizeError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SummarizeError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            SummarizeError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            SummarizeError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(SummarizeError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let filename = extract_filename(url, content_type.as_deref());

    let temp_dir = TempDir::new().map_err(|e| SummarizeError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            SummarizeError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            SummarizeError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| SummarizeError::Internal(format!("Failed to write temp file: {}", e)))?;

    DocumentFormat::from_path(&file_path)?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Pick a filename from the URL path, else derive an extension from the
/// `Content-Type` header.
fn extract_filename(url: &str, content_type: Option<&str>) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|m| m.trim().to_lowercase())
        .unwrap_or_default();
    let extension = match mime.as_str() {
        "application/pdf" => "pdf",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => "pptx",
        "text/markdown" => "md",
        m if m.starts_with("text/") => "txt",
        _ => "pdf",
    };
    format!("downloaded.{extension}")
}

/// Extract the text of a local document. Runs the parser on the blocking pool.
pub async fn extract_text(path: &Path) -> Result<String, SummarizeError> {
    let format = DocumentFormat::from_path(path)?;
    let owned = path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || extract_text_blocking(&owned, format))
        .await
        .map_err(|e| SummarizeError::Internal(format!("Extraction task panicked: {e}")))??;
    debug!(
        "Extracted {} chars from {}",
        text.chars().count(),
        path.display()
    );
    Ok(text)
}

/// Synchronous extraction for an already-detected format.
pub fn extract_text_blocking(path: &Path, format: DocumentFormat) -> Result<String, SummarizeError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SummarizeError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => SummarizeError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => extraction_failed(path, e),
    })?;

    let text = match format {
        DocumentFormat::PlainText => String::from_utf8_lossy(&bytes).into_owned(),
        DocumentFormat::Pdf => extract_pdf(&bytes).map_err(|e| extraction_failed(path, e))?,
        DocumentFormat::Docx => extract_docx(&bytes).map_err(|e| extraction_failed(path, e))?,
        DocumentFormat::Pptx => extract_pptx(&bytes).map_err(|e| extraction_failed(path, e))?,
    };
    Ok(text.trim().to_string())
}

fn extraction_failed(path: &Path, detail: impl ToString) -> SummarizeError {
    SummarizeError::ExtractionFailed {
        path: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, String> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| e.to_string())?;
    // Pages come back separated by form feeds.
    Ok(text
        .split('\x0C')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn extract_docx(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let xml = read_entry(&mut archive, "word/document.xml")?;
    Ok(ooxml_text(&xml, &RE_DOCX_RUN))
}

fn extract_pptx(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            RE_SLIDE_NAME
                .captures(name)
                .and_then(|c| c[1].parse::<u32>().ok())
                .map(|n| (n, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(n, _)| *n);

    let mut texts = Vec::with_capacity(slides.len());
    for (_, name) in &slides {
        let xml = read_entry(&mut archive, name)?;
        let text = ooxml_text(&xml, &RE_PPTX_RUN);
        if !text.is_empty() {
            texts.push(text);
        }
    }
    Ok(texts.join("\n"))
}

fn read_entry(archive: &mut zip::ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<String, String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| format!("missing {name}: {e}"))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| format!("reading {name}: {e}"))?;
    Ok(xml)
}

// `<w:t>` / `<a:t>` text runs, plus paragraph ends. `\s` after the tag name
// keeps `<w:tab/>` and `<w:tbl>` from matching.
static RE_DOCX_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|</w:p>").unwrap());
static RE_PPTX_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<a:t(?:\s[^>]*)?>(.*?)</a:t>|</a:p>").unwrap());
static RE_SLIDE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

/// Concatenate the text runs of an OOXML part, one line per paragraph.
fn ooxml_text(xml: &str, runs: &Regex) -> String {
    let mut out = String::new();
    for caps in runs.captures_iter(xml) {
        match caps.get(1) {
            Some(run) => out.push_str(&decode_xml_entities(run.as_str())),
            None => out.push('\n'),
        }
    }
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_XML_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#x([0-9A-Fa-f]+)|#([0-9]+)|(lt|gt|quot|apos|amp));").unwrap()
});

/// Decode named and numeric character references in one pass, so
/// `&amp;#38;` stays `&#38;`. Unknown or out-of-range references are kept.
fn decode_xml_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    RE_XML_ENTITY
        .replace_all(s, |caps: &regex::Captures<'_>| {
            let code = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(hex), _, _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (_, Some(dec), _) => dec.as_str().parse::<u32>().ok(),
                (_, _, Some(name)) => match name.as_str() {
                    "lt" => Some('<' as u32),
                    "gt" => Some('>' as u32),
                    "quot" => Some('"' as u32),
                    "apos" => Some('\'' as u32),
                    _ => Some('&' as u32),
                },
                _ => None,
            };
            match code.and_then(char::from_u32) {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
