//! The matching engine: equation store, low-type unification, the
//! API matcher pipeline, per-mode initialization strategies, and the
//! search driver.

pub mod compexpr;
pub mod constraints;
pub mod engine;
pub mod equations;
pub mod lowtype;
pub mod matchers;
pub mod query;
pub mod strategy;

pub use engine::{search, SearchResultItem};
pub use equations::{Context, Equations, MatchingResult};
pub use lowtype::LowTypeMatcher;
