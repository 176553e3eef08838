// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use lazy_static::lazy_static;
use prometheus::{IntGauge, Registry};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref CONNECTED_PEERS: IntGauge = register(IntGauge::new(
        "p2p_connected_peers_gauge",
        "Number of peers with a live session",
    )
    .unwrap());
    pub static ref DISCOVERED_NODES: IntGauge = register(IntGauge::new(
        "p2p_discovered_node_count",
        "Nodes currently held in the discovered cache",
    )
    .unwrap());
    pub static ref DIALING_NODES: IntGauge = register(IntGauge::new(
        "p2p_dialing_new_node_gauge",
        "Nodes currently being dialed",
    )
    .unwrap());
}

fn register(gauge: IntGauge) -> IntGauge {
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
}
