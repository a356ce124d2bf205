//! LLDP: periodic neighbor announcements and a per-port peer database.

use crate::ethernet::{EthernetAddress, Ipv4Address};
use crate::MAX_LLDP_PEERS;

/// EtherType 0x88CC: Link Layer Discovery Protocol.
pub const ETHERTYPE: u16 = 0x88cc;

pub const TYPE_END: u8 = 0;
pub const TYPE_CHASSIS_ID: u8 = 1;
pub const TYPE_PORT_ID: u8 = 2;
pub const TYPE_TTL: u8 = 3;
pub const TYPE_PORT_DESCRIPTION: u8 = 4;
pub const TYPE_MANAGEMENT_ADDRESS: u8 = 8;
pub const TYPE_ORG_SPEC: u8 = 127;

pub const SUBTYPE_CHASSIS_LOCALLY_ASSIGNED: u8 = 7;
pub const SUBTYPE_PORT_LOCALLY_ASSIGNED: u8 = 7;

const MAX_STRING_LEN: usize = 255;

/// A byte-valued identifier TLV field (chassis id / port id carry raw bytes, not necessarily
/// text -- e.g. a MAC-subtype chassis id). Since every LLDP TLV is optional, a peer missing it
/// (or whose declared length exceeds our receive buffer) just carries `is_valid = false` rather
/// than failing the whole parse.
#[derive(Debug, Clone, Default)]
pub struct IdField {
    pub value: heapless::Vec<u8, MAX_STRING_LEN>,
    pub subtype: u8,
    pub is_valid: bool,
}

impl IdField {
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.value).unwrap_or("")
    }
}

/// A printable-text TLV field (port description).
#[derive(Debug, Clone, Default)]
pub struct StringField {
    pub value: heapless::String<MAX_STRING_LEN>,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ManagementAddress {
    pub value: [u8; 31],
    pub len: u8,
    pub subtype: u8,
    pub if_index: u32,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PhyConfig {
    pub autonegotiation_supported: bool,
    pub autonegotiation_enabled: bool,
    pub advertised_capabilities: u16,
    pub operational_mau_type: u16,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PortDelay {
    pub cable_delay_local: u32,
    pub rx_delay_local: u32,
    pub tx_delay_local: u32,
    pub rx_delay_remote: u32,
    pub tx_delay_remote: u32,
    pub is_valid: bool,
}

/// Everything learned about a neighbor on one physical port.
#[derive(Debug, Clone, Default)]
pub struct PeerInfo {
    pub chassis_id: IdField,
    pub port_id: IdField,
    pub port_description: StringField,
    pub management_address: ManagementAddress,
    pub phy_config: PhyConfig,
    pub port_delay: PortDelay,
    /// 10ms system-uptime ticks at reception.
    pub timestamp_10ms: u32,
}

/// Per-port peer table, one slot per physical port (index 0 unused, ports are 1-based).
#[derive(Default)]
pub struct PeerTable {
    peers: heapless::Vec<Option<PeerInfo>, MAX_LLDP_PEERS>,
}

impl PeerTable {
    pub fn new(n_ports: usize) -> Self {
        let mut peers = heapless::Vec::new();
        for _ in 0..n_ports {
            let _ = peers.push(None);
        }
        Self { peers }
    }

    /// Store (overwriting) the peer seen on `port` (1-based), stamping `now_10ms`.
    pub fn store(&mut self, port: usize, mut peer: PeerInfo, now_10ms: u32) {
        if port == 0 || port > self.peers.len() {
            return;
        }
        peer.timestamp_10ms = now_10ms;
        self.peers[port - 1] = Some(peer);
    }

    pub fn get(&self, port: usize) -> Option<&PeerInfo> {
        if port == 0 || port > self.peers.len() {
            return None;
        }
        self.peers[port - 1].as_ref()
    }
}

fn read_u16(tlv_header: [u8; 2]) -> (u8, u16) {
    let first = u16::from_be_bytes(tlv_header);
    ((first >> 9) as u8, first & 0x01ff)
}

/// Walk a received LLDP frame's TLVs and populate `peer`. Returns `Err(())` only for a
/// structurally broken TLV stream (header truncated mid-TLV); a TLV whose declared length
/// exceeds what its destination field can hold is skipped with that field left `is_valid =
/// false`, per the tolerant-parse contract LLDP peers are allowed to rely on.
pub fn parse_packet(bytes: &[u8]) -> Result<PeerInfo, ()> {
    let mut peer = PeerInfo::default();
    let mut pos = 0usize;

    while pos + 2 <= bytes.len() {
        let (tlv_type, len) = read_u16([bytes[pos], bytes[pos + 1]]);
        let len = len as usize;
        pos += 2;
        if tlv_type == TYPE_END {
            break;
        }
        if pos + len > bytes.len() {
            return Err(());
        }
        let payload = &bytes[pos..pos + len];
        pos += len;

        match tlv_type {
            TYPE_CHASSIS_ID => fill_id_field(&mut peer.chassis_id, payload),
            TYPE_PORT_ID => fill_id_field(&mut peer.port_id, payload),
            TYPE_PORT_DESCRIPTION => {
                if let Ok(s) = core::str::from_utf8(payload) {
                    if peer.port_description.value.push_str(s).is_ok() {
                        peer.port_description.is_valid = true;
                    }
                }
            }
            TYPE_MANAGEMENT_ADDRESS => fill_management_address(&mut peer.management_address, payload),
            _ => {}
        }
    }

    Ok(peer)
}

fn fill_id_field(field: &mut IdField, payload: &[u8]) {
    // Subtype byte, then the raw identifier bytes.
    if payload.is_empty() {
        return;
    }
    let subtype = payload[0];
    let body = &payload[1..];
    if field.value.extend_from_slice(body).is_err() {
        field.is_valid = false;
        return;
    }
    field.subtype = subtype;
    field.is_valid = true;
}

fn fill_management_address(addr: &mut ManagementAddress, payload: &[u8]) {
    // [len][subtype][address...][if_index_subtype][if_index (4 bytes)][oid_len]
    if payload.len() < 2 {
        return;
    }
    let addr_string_len = payload[0] as usize;
    if addr_string_len == 0 || addr_string_len > payload.len() - 1 {
        addr.is_valid = false;
        return;
    }
    let addr_subtype = payload[1];
    let addr_len = addr_string_len - 1;
    if addr_len > addr.value.len() {
        addr.is_valid = false;
        return;
    }
    let addr_bytes = &payload[2..2 + addr_len];
    let tail_start = 2 + addr_len;
    if payload.len() < tail_start + 5 {
        addr.is_valid = false;
        return;
    }
    let if_index = u32::from_be_bytes([
        payload[tail_start + 1],
        payload[tail_start + 2],
        payload[tail_start + 3],
        payload[tail_start + 4],
    ]);

    addr.value[..addr_len].copy_from_slice(addr_bytes);
    addr.len = addr_len as u8;
    addr.subtype = addr_subtype;
    addr.if_index = if_index;
    addr.is_valid = true;
}

/// Build a TLV and append it to `out`. Returns `false` (leaving `out` unchanged) if it would not
/// fit.
fn push_tlv(out: &mut heapless::Vec<u8, { crate::MAX_FRAME_SIZE }>, tlv_type: u8, payload: &[u8]) -> bool {
    let header = (((tlv_type as u16) << 9) | payload.len() as u16).to_be_bytes();
    if out.extend_from_slice(&header).is_err() {
        return false;
    }
    out.extend_from_slice(payload).is_ok()
}

/// Construct a full periodic LLDP frame body (chassis id, port id, TTL, port description,
/// management address, then end-of-LLDPDU). Management address TLV is included only when `ip` is
/// specified.
pub fn build_frame(
    device_mac: EthernetAddress,
    port_id: &str,
    port_description: &str,
    ttl_seconds: u16,
    ip: Option<(Ipv4Address, u32)>,
) -> heapless::Vec<u8, { crate::MAX_FRAME_SIZE }> {
    let mut out = heapless::Vec::new();

    let mut chassis_payload = heapless::Vec::<u8, 8>::new();
    let _ = chassis_payload.push(SUBTYPE_CHASSIS_LOCALLY_ASSIGNED);
    let _ = chassis_payload.extend_from_slice(device_mac.as_bytes());
    push_tlv(&mut out, TYPE_CHASSIS_ID, &chassis_payload);

    let mut port_payload = heapless::Vec::<u8, 256>::new();
    let _ = port_payload.push(SUBTYPE_PORT_LOCALLY_ASSIGNED);
    let _ = port_payload.extend_from_slice(port_id.as_bytes());
    push_tlv(&mut out, TYPE_PORT_ID, &port_payload);

    push_tlv(&mut out, TYPE_TTL, &ttl_seconds.to_be_bytes());
    push_tlv(&mut out, TYPE_PORT_DESCRIPTION, port_description.as_bytes());

    if let Some((addr, if_index)) = ip {
        let mut mgmt = heapless::Vec::<u8, 16>::new();
        let _ = mgmt.push(5); // address string length: subtype byte + 4 IPv4 octets
        let _ = mgmt.push(1); // IPv4 subtype
        let _ = mgmt.extend_from_slice(&addr.0);
        let _ = mgmt.push(2); // interface subtype: ifIndex
        let _ = mgmt.extend_from_slice(&if_index.to_be_bytes());
        let _ = mgmt.push(0); // OID length
        push_tlv(&mut out, TYPE_MANAGEMENT_ADDRESS, &mgmt);
    }

    push_tlv(&mut out, TYPE_END, &[]);
    out
}

/// Generate the PN-aliasing DNS fallback name: if `port_id` already contains a `.` (PN v2.3+
/// naming), the alias is just `port_id`; otherwise (legacy PN v2.2) it is `port_id.station_name`.
/// Fails if the result would not fit in `cap` bytes.
pub fn generate_alias_name(port_id: &str, station_name: &str, cap: usize) -> Result<heapless::String<96>, ()> {
    let mut alias = heapless::String::new();
    if port_id.contains('.') {
        alias.push_str(port_id).map_err(|_| ())?;
    } else {
        alias.push_str(port_id).map_err(|_| ())?;
        alias.push('.').map_err(|_| ())?;
        alias.push_str(station_name).map_err(|_| ())?;
    }
    if alias.len() + 1 > cap {
        return Err(());
    }
    Ok(alias)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_appends_station_name_when_port_id_has_no_dot() {
        let alias = generate_alias_name("port-001", "dut", 13).unwrap();
        assert_eq!(alias.as_str(), "port-001.dut");
        assert!(generate_alias_name("port-001", "dut", 12).is_err());
    }

    #[test]
    fn alias_is_just_port_id_when_it_already_has_a_dot() {
        let alias = generate_alias_name("port-001.dut", "tester", 13).unwrap();
        assert_eq!(alias.as_str(), "port-001.dut");
        assert!(generate_alias_name("port-001.dut", "tester", 12).is_err());
    }

    #[test]
    fn build_then_parse_round_trips_fields() {
        let mac = EthernetAddress([0x12, 0x34, 0x00, 0x78, 0x90, 0xab]);
        let frame = build_frame(mac, "port-001", "my port", 20, Some((Ipv4Address::new(192, 168, 10, 102), 1)));
        let peer = parse_packet(&frame).unwrap();

        assert!(peer.chassis_id.is_valid);
        assert_eq!(peer.chassis_id.subtype, SUBTYPE_CHASSIS_LOCALLY_ASSIGNED);
        assert_eq!(peer.chassis_id.value.as_slice(), mac.as_bytes());

        assert!(peer.port_id.is_valid);
        assert_eq!(peer.port_id.as_str(), "port-001");

        assert!(peer.management_address.is_valid);
        assert_eq!(&peer.management_address.value[..4], &[192, 168, 10, 102]);
        assert_eq!(peer.management_address.if_index, 1);
    }

    #[test]
    fn truncated_tlv_is_a_parse_error() {
        // Chassis-ID TLV claims 10 bytes of payload but only 1 follows.
        let bytes = [((TYPE_CHASSIS_ID as u16) << 9 | 10).to_be_bytes()[0], ((TYPE_CHASSIS_ID as u16) << 9 | 10).to_be_bytes()[1], 0x07];
        assert!(parse_packet(&bytes).is_err());
    }

    #[test]
    fn store_and_retrieve_per_port() {
        let mut table = PeerTable::new(4);
        table.store(2, PeerInfo::default(), 55);
        assert!(table.get(2).is_some());
        assert_eq!(table.get(2).unwrap().timestamp_10ms, 55);
        assert!(table.get(1).is_none());
        assert!(table.get(5).is_none());
    }
}
