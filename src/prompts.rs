//! Prompts for every pipeline stage.
//!
//! Every instruction sent to the completion service lives here. Tests
//! import these constants to check which template a stage used, so a
//! wording change never needs a live model to verify.
//!
//! Callers can override the analyst system prompt via
//! [`crate::config::SummaryConfig::system_prompt`]; the normalizer prompt is fixed.

use crate::config::SummaryTier;

/// System prompt for the chunk-summary and synthesis stages.
pub const ANALYST_SYSTEM_PROMPT: &str = "You are an expert document analysis and summarization AI. \
You produce accurate, coherent, and high-quality summaries.";

/// System prompt for the normalizer stage.
pub const NORMALIZE_SYSTEM_PROMPT: &str = "You are an expert document preprocessing AI. \
Your task is to clean and normalize extracted document text.";

/// Cleanup rules sent ahead of the raw text. The last rule is the important one.
pub const NORMALIZE_INSTRUCTIONS: &str = r#"INSTRUCTIONS:
- Remove headers, footers, page numbers
- Remove duplicated or repeated content
- Fix broken sentences and paragraphs
- Convert bullet points into complete sentences
- Remove formatting noise and symbols
- Preserve all important information
- Maintain logical flow
- DO NOT summarize"#;

/// Instruction for each chunk summary.
pub const CHUNK_INSTRUCTIONS: &str = "Summarize this section clearly and accurately.
Focus only on meaningful ideas and key points.";

pub const SHORT_TIER_INSTRUCTIONS: &str = "Create an executive-level summary using 7–10 concise bullet points.
Focus on core ideas, insights, and conclusions.
Avoid repetition and fluff.";

pub const MEDIUM_TIER_INSTRUCTIONS: &str = "Write a professional and coherent summary of 180–250 words.
Maintain logical flow.
Cover all major concepts, arguments, and conclusions.";

pub const LONG_TIER_INSTRUCTIONS: &str = "Create a detailed, structured summary with clear headings:
- Introduction
- Main Sections
- Key Findings / Arguments
- Conclusion

Explain ideas clearly and comprehensively.
Avoid redundancy.";

/// Separator placed between chunk summaries in the synthesis input.
pub const FRAGMENT_SEPARATOR: &str = "\n\n";

/// The synthesis instruction for a tier.
pub fn tier_instructions(tier: SummaryTier) -> &'static str {
    match tier {
        SummaryTier::Short => SHORT_TIER_INSTRUCTIONS,
        SummaryTier::Medium => MEDIUM_TIER_INSTRUCTIONS,
        SummaryTier::Long => LONG_TIER_INSTRUCTIONS,
    }
}

/// User message for the normalizer.
pub fn normalize_message(raw_text: &str) -> String {
    format!("{NORMALIZE_INSTRUCTIONS}\n\nTEXT:\n{raw_text}\n")
}

/// User message for one chunk summary.
pub fn chunk_message(chunk_text: &str) -> String {
    format!("{CHUNK_INSTRUCTIONS}\n\nTEXT:\n{chunk_text}\n")
}

/// User message for the synthesis call. `combined` is the joined fragments.
pub fn synthesis_message(tier: SummaryTier, combined: &str) -> String {
    format!("{}\n\nDOCUMENT CONTENT:\n{combined}\n", tier_instructions(tier))
}
