use std::net::SocketAddr;

use envconfig::Envconfig;
use tracing::Level;

#[derive(Envconfig, Clone)]
pub struct Config {
    // When off, events are acknowledged but never recorded
    #[envconfig(default = "true")]
    pub enabled: bool,

    #[envconfig(default = "psdoaAnalytics")]
    pub adapter_name: String,

    #[envconfig(default = "127.0.0.1:3000")]
    pub address: SocketAddr,

    // Write records to stdout through a queue instead of the log target
    #[envconfig(default = "false")]
    pub print_sink: bool,

    #[envconfig(default = "10000")]
    pub channel_capacity: usize,

    // Used for integration tests
    #[envconfig(default = "true")]
    pub export_prometheus: bool,

    #[envconfig(default = "info")]
    pub log_level: Level,
}
