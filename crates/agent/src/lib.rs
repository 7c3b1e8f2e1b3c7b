//! The plan/act/reflect agent loop.
//!
//! A run moves through three steps until the goal is judged complete or an
//! iteration cap is hit:
//!
//! 1. **Plan**: ask the model for a plan, given the goal, the available
//!    tools and the transcript so far
//! 2. **Act**: extract tool invocations from the plan and execute them
//!    through the registry, folding failures into the result text
//! 3. **Reflect**: ask the model whether the goal is met

pub mod loop_runner;
pub mod plan;
pub mod prompt;

#[cfg(test)]
mod test_helpers;

pub use loop_runner::{PlanActReflectLoop, RunFailure, RunReport};
pub use plan::{Plan, ToolInvocation, parse_plan};
