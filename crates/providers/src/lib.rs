//! Completion provider implementations for planloop.
//!
//! All providers implement the `planloop_core::Provider` trait.
//! The router selects the correct provider based on configuration.

pub mod fallback;
pub mod openai_compat;
pub mod router;
pub mod scripted;

#[cfg(test)]
mod test_server;

pub use fallback::FallbackProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
pub use scripted::ScriptedProvider;
