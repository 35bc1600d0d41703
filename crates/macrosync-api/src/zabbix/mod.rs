mod client;
mod models;

pub use client::ZabbixClient;
pub use models::{HostMacro, MacroType};
