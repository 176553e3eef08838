// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use thor_shared::Bytes32;

/// Network identity of a node.
pub type NodeId = Bytes32;

/// A peer's network identity as learned from discovery or configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub id: NodeId,
    pub ip: IpAddr,
    pub udp: u16,
    pub tcp: u16,
    /// Unix seconds of the last observed liveness.
    pub last_seen: u64,
}

impl NodeDescriptor {
    pub fn new(id: NodeId, ip: IpAddr, udp: u16, tcp: u16) -> Self {
        Self {
            id,
            ip,
            udp,
            tcp,
            last_seen: 0,
        }
    }
}

impl fmt::Debug for NodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Node({}@{}:{})",
            &hex::encode(self.id.as_bytes())[..8],
            self.ip,
            self.tcp
        )
    }
}

impl Encodable for NodeDescriptor {
    fn rlp_append(&self, s: &mut RlpStream) {
        let ip_bytes: Vec<u8> = match self.ip {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        };
        s.begin_list(5)
            .append(&self.id)
            .append(&ip_bytes)
            .append(&self.udp)
            .append(&self.tcp)
            .append(&self.last_seen);
    }
}

impl Decodable for NodeDescriptor {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        let ip_bytes: Vec<u8> = rlp.val_at(1)?;
        let ip = match ip_bytes.len() {
            4 => IpAddr::V4(Ipv4Addr::from(<[u8; 4]>::try_from(ip_bytes.as_slice()).unwrap())),
            16 => IpAddr::V6(Ipv6Addr::from(
                <[u8; 16]>::try_from(ip_bytes.as_slice()).unwrap(),
            )),
            _ => return Err(DecoderError::Custom("bad ip length")),
        };
        Ok(Self {
            id: rlp.val_at(0)?,
            ip,
            udp: rlp.val_at(2)?,
            tcp: rlp.val_at(3)?,
            last_seen: rlp.val_at(4)?,
        })
    }
}

/// Serializes a node list for the persisted good-node cache.
pub fn encode_nodes(nodes: &[NodeDescriptor]) -> Vec<u8> {
    rlp::encode_list::<NodeDescriptor, _>(nodes).to_vec()
}

pub fn decode_nodes(raw: &[u8]) -> Result<Vec<NodeDescriptor>, DecoderError> {
    Rlp::new(raw).as_list()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn node(n: u8) -> NodeDescriptor {
        NodeDescriptor::new(
            Bytes32::repeat_byte(n),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, n)),
            30_303,
            11_235,
        )
    }

    #[test]
    fn descriptor_rlp_round_trip() {
        let mut a = node(1);
        a.last_seen = 12_345;
        let encoded = rlp::encode(&a).to_vec();
        let decoded: NodeDescriptor = rlp::decode(&encoded).unwrap();
        assert_eq!(decoded, a);
    }

    #[test]
    fn v6_round_trip() {
        let mut a = node(2);
        a.ip = IpAddr::V6(Ipv6Addr::LOCALHOST);
        let decoded: NodeDescriptor = rlp::decode(&rlp::encode(&a)).unwrap();
        assert_eq!(decoded, a);
    }

    #[test]
    fn node_list_round_trip() {
        let nodes = vec![node(1), node(2), node(3)];
        let decoded = decode_nodes(&encode_nodes(&nodes)).unwrap();
        assert_eq!(decoded, nodes);
    }
}
