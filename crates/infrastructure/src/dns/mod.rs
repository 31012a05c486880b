pub mod cache;
pub mod server;
pub mod upstream;

pub use cache::{NullResponseCache, ResponseCache};
pub use server::{DnsServerHandler, ListenerConfig};
