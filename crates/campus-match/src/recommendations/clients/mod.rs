//! HTTP adapters for the external collaborators.

mod chat_completion;
mod scorecard;

pub use chat_completion::{parse_candidates, ChatCompletionSource};
pub use scorecard::{parse_stats, ScorecardLookup};
