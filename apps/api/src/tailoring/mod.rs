// Resume tailoring: prompt construction, schema contract, and the
// schema-then-JSON-object completion flow.
// All completion calls go through llm_client — no direct OpenAI calls here.

pub mod handlers;
pub mod models;
pub mod prompts;
pub mod schema;
pub mod tailor;
