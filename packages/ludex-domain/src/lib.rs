pub mod diversity;
pub mod fusion;
pub mod pager;
pub mod query;
pub mod suggest;

mod types;

pub use types::{GameMetadata, ResultItem, SparseVector, Suggestion};
