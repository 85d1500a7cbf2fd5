//! These models represent the objects passed around by the relay
//!
//! There are several related formats we need to interact with:
//! - browser-style wire messages, where content is either a plain string or
//!   a JSON-encoded array of text/image parts
//! - the upstream chat-completions message/content shapes
//! - the upstream text-completions transcript input
//!
//! These overlap but none of them is a good internal representation, so the
//! wire boundary converts into these structs immediately and everything past
//! the boundary works with the explicit content union.
pub mod content;
pub mod message;
pub mod role;
