mod chart;
mod conversation;
mod provider;

pub use chart::{ChartProvider, GeoResolver};
pub use conversation::{Message, Role, ToolCall};
pub use provider::{ModelProvider, ProviderResponse, TokenUsage};
