// Session controller: the per-interview context object, recording timers,
// transcript rules, question lifecycle, and their HTTP handlers.

pub mod context;
pub mod handlers;
pub mod questions;
pub mod recording;
pub mod transcript;
