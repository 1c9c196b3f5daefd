// Resume pipeline: structuring, compatibility scoring, HTML rendering.
// Every step is a PromptedStep; all generation calls go through llm_client.

pub mod handlers;
pub mod prompts;
pub mod rendering;
pub mod scoring;
pub mod step;
pub mod structuring;
