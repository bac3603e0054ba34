// Prompt fragments for proposal generation.
// Assembled with `push_str` so user text is embedded verbatim, never treated as a template.

pub const PROPOSAL_INTRO: &str = "Write a professional proposal for the following job:\n\n";

pub const PORTFOLIO_INSTRUCTION: &str = "Include a brief mention of the applicant's portfolio.\n";

pub const PROPOSAL_OUTRO: &str = "\nProposal:\n";

/// Builds the proposal prompt for a job posting.
pub fn build_proposal_prompt(title: &str, description: &str, include_portfolio: bool) -> String {
    let mut prompt = String::with_capacity(
        PROPOSAL_INTRO.len() + title.len() + description.len() + PORTFOLIO_INSTRUCTION.len() + 64,
    );
    prompt.push_str(PROPOSAL_INTRO);
    prompt.push_str("Title: ");
    prompt.push_str(title);
    prompt.push_str("\nDescription: ");
    prompt.push_str(description);
    prompt.push('\n');
    if include_portfolio {
        prompt.push_str(PORTFOLIO_INSTRUCTION);
    }
    prompt.push_str(PROPOSAL_OUTRO);
    prompt
}
