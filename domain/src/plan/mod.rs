//! Planner reply parsing

pub mod parser;

pub use parser::{ParsedPlan, PlanParseError, extract_payload, parse_plan};
