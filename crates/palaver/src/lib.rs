pub mod client;
pub mod completion;
pub mod errors;
pub mod models;
pub mod normalize;
pub mod relay;
