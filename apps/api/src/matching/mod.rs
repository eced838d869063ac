// Resume ↔ job posting matching.
// Flow: scheduler/handlers → runner → cache →
//       (store hit | evaluator → scorer → store insert).
// All model calls go through llm_client via scorer::LlmScorer.

pub mod cache;
pub mod evaluator;
pub mod fingerprint;
pub mod handlers;
pub mod prompts;
pub mod registry;
pub mod runner;
pub mod scheduler;
pub mod scorer;
pub mod store;
