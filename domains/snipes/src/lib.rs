//! Snipes domain: timeline analysis, ticker-call fact checking, reliability reports

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::analyzer::{AnalyzeError, Analysis, SnipeAnalyzer, POST_LIMIT};
pub use domain::entities::{AppUser, SnipeRecord};
pub use domain::extraction::{build_analysis_prompt, parse_ticker_calls, Sentiment, TickerCalls};
pub use domain::fact_check::{fact_check, judge_call, FactCheck};

// Re-export repository types
pub use repository::{SnipeRepository, SnipesRepositories, UserRepository};

// Re-export API types
pub use api::routes;
pub use api::SnipesState;
