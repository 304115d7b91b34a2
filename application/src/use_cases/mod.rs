//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod execute_step;
pub mod judge_relevance;
pub mod plan_steps;
pub mod run_query;
