//! Retrieval Engine (C8): ranks tables against a free-text query by
//! lexical similarity, embedding similarity, or a fused combination.

pub mod engine;
pub mod lexical;
pub mod tokenize;

pub use engine::{retrieve, RetrievalOptions, ScoredTable, Strategy};
pub use tokenize::tokenize;
