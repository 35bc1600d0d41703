// macrosync-api: Async clients for the services macrosync talks to
// (NetBox inventory, Zabbix monitoring, Vault secrets, debug webhook).

pub mod error;
pub mod netbox;
pub mod notify;
pub mod transport;
pub mod vault;
pub mod zabbix;

pub use error::Error;
pub use netbox::{NestedRef, NetBoxClient, NetBoxDevice};
pub use notify::{DebugWebhook, NotifyPayload};
pub use transport::{TlsMode, TransportConfig};
pub use vault::{KvSecret, VaultClient};
pub use zabbix::{HostMacro, MacroType, ZabbixClient};
