mod client;
mod models;

pub use client::NetBoxClient;
pub use models::{NestedRef, NetBoxDevice};
