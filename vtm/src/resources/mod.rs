//! Resource implementations
pub mod dns_zone;
pub mod dns_zone_file;
pub mod fields;
pub mod glb;
pub mod lifecycle;
pub mod rule;
pub mod ssl_key;
pub mod text;
pub mod traffic_manager;
pub mod virtual_server;

pub use dns_zone::DnsZoneResource;
pub use dns_zone_file::DnsZoneFileResource;
pub use glb::GlbResource;
pub use rule::RuleResource;
pub use ssl_key::{SslKeyKind, SslKeyResource};
pub use traffic_manager::TrafficManagerResource;
pub use virtual_server::VirtualServerResource;
