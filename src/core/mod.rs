//! Normalization pipeline and its stages

pub mod consolidate;
pub mod dates;
pub mod deriver;
pub mod finalize;
pub mod pipeline;
pub mod random;
pub mod redistribute;
pub mod rewrite;

pub use pipeline::{Pipeline, ProcessedFile, RunReport};
pub use random::{seeded_or_entropy, Chooser};
pub use rewrite::PromotionRewriter;
