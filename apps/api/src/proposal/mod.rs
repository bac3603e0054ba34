// Proposal generation: prompt building, LLM call, markup stripping.
// All LLM calls go through llm_client — no direct Gemini calls here.

pub mod generator;
pub mod handlers;
pub mod prompts;
