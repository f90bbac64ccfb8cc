// Upstream session machinery: browser header emulation, outbound proxy
// selection, and the vqd handshake + completion client.

pub mod client;
pub mod emulation;
pub mod proxy_pool;

pub use client::UpstreamClient;
pub use proxy_pool::ProxyPicker;
