pub mod base;
pub mod chat;
pub mod completer;
pub mod responses;
pub mod select;

pub use base::{CompletionStrategy, RequestContext};
pub use completer::Completer;
pub use select::candidate_strategies;
