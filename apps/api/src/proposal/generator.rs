//! Proposal Generator — turns job metadata into a plain-text proposal via the LLM.

use tracing::{debug, info};

use crate::llm_client::{LlmError, TextGenerator};
use crate::proposal::prompts::build_proposal_prompt;

/// Builds the prompt, asks the generator for a proposal and strips markup from the reply.
pub async fn generate_proposal(
    generator: &dyn TextGenerator,
    title: &str,
    description: &str,
    include_portfolio: bool,
) -> Result<String, LlmError> {
    let prompt = build_proposal_prompt(title, description, include_portfolio);
    debug!("Proposal prompt built: {} chars", prompt.len());

    let raw = generator.generate(&prompt).await?;
    let proposal = sanitize_proposal(&raw);

    info!(
        "Proposal generated: raw_len={}, final_len={}, include_portfolio={}",
        raw.len(),
        proposal.len(),
        include_portfolio
    );
    Ok(proposal)
}

/// Removes markdown emphasis characters and surrounding whitespace.
///
/// The `**` pass can never match after the `*` pass; it is kept so the
/// output stays identical to older clients' expectations.
pub fn sanitize_proposal(raw: &str) -> String {
    raw.trim()
        .replace('*', "")
        .replace("**", "")
        .trim()
        .to_string()
}
