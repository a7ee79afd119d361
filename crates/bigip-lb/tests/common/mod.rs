#![allow(dead_code)]

use std::sync::Arc;

use bigip_lb::Lb;
use bigip_session::testing::FakeDevice;
use bigip_session::{ConfigBuilder, Connection};

pub const HOST: &str = "https://lb1.example.com";

pub fn connect(device: &FakeDevice) -> Arc<Connection> {
    connect_to(device, HOST)
}

pub fn connect_to(device: &FakeDevice, host: &str) -> Arc<Connection> {
    let config = ConfigBuilder::new()
        .url(url::Url::parse(host).unwrap())
        .username("admin")
        .build()
        .unwrap();
    let conn = Connection::open(&config, device.clone()).unwrap();
    device.clear_calls();
    Arc::new(conn)
}

pub fn open(device: &FakeDevice) -> Lb {
    Lb::new(connect(device))
}

/// Device sitting at the root folder with recursive queries off.
pub fn at_root(device: &FakeDevice) -> Lb {
    device.set_folder("/");
    device.set_recursive(false);
    open(device)
}

/// Two partitions with pools, nodes, rules and virtual servers.
pub fn seeded() -> FakeDevice {
    let device = FakeDevice::new();
    for pool in ["/Common/www-1", "/Common/api", "/App/www-2", "/App/sub/www-3"] {
        device.seed_pool(pool);
    }
    device.seed_member("/Common/www-1", "/Common/10.0.0.1", 80);
    device.seed_member("/Common/www-1", "/Common/10.0.0.2", 80);
    device.seed_member("/Common/api", "/Common/10.0.0.3", 8080);
    device.seed_node("/Common/10.0.0.1", "10.0.0.1");
    device.seed_node("/Common/10.0.0.2", "10.0.0.2");
    device.seed_node("/App/10.1.0.1", "10.1.0.1");
    device.seed_rule("/Common/redirect", "when HTTP_REQUEST { HTTP::redirect / }");
    device.seed_virtual_server("/Common/www-vs", "/Common/192.0.2.10", 80, "/Common/www-1");
    device.seed_virtual_server("/Common/www-vs-tls", "/Common/192.0.2.10", 443, "/Common/www-1");
    device.seed_virtual_server("/App/api-vs", "/App/192.0.2.20", 80, "/Common/api");
    device
}
