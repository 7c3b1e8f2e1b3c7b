//! Library half of the planloop binary: run assembly and result rendering,
//! kept out of `main.rs` so integration tests can drive them.

pub mod output;
pub mod session;
