//! Tool surface for an LLM trading agent.

mod tools;

pub use tools::{describe_holdings, ToolResponse, TradingToolkit};
