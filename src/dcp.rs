//! DCP: discovery and configuration over raw Ethernet (EtherType 0x8892, sub-frame 0xFEFD/0xFEFE).

use crate::ethernet::{dcp_subframe, EthernetAddress, ETHERTYPE_PROFINET};

/// Service ID, the first byte of a DCP PDU (after the sub-frame marker).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceId {
    Get,
    Set,
    Identify,
    Hello,
}

/// Service type: request or (positive/negative) response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    Request,
    ResponseSuccess,
    ResponseError,
}

/// A single decoded DCP block header (option/suboption pair plus its payload slice).
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    pub option: u8,
    pub suboption: u8,
    pub payload: &'a [u8],
}

/// The "signal" (flash LED) suboption code under option 0x05 (Control).
pub const OPTION_CONTROL: u8 = 0x05;
pub const SUBOPTION_SIGNAL: u8 = 0x03;
pub const SUBOPTION_FACTORY_RESET: u8 = 0x05;
pub const OPTION_IP: u8 = 0x01;
pub const SUBOPTION_IP_SUITE: u8 = 0x02;
pub const OPTION_DEVICE_PROPERTIES: u8 = 0x02;
pub const SUBOPTION_NAME_OF_STATION: u8 = 0x02;

/// Parsed DCP header: everything before the variable-length block list.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub service_id: ServiceId,
    pub service_type: ServiceType,
    pub xid: u32,
    pub dcp_data_length: u16,
}

/// Parse a DCP Ethernet frame's header (12 + 12 MAC bytes + 2 ethertype + 2 sub-frame already
/// stripped by the caller's frame classifier; `pdu` starts at the service-id byte). Returns
/// `None` for anything this responder doesn't recognize, or whose declared `dcp_data_length`
/// overruns the actual payload -- both cases are silently dropped, never replied to.
pub fn parse_header(pdu: &[u8]) -> Option<(Header, &[u8])> {
    if pdu.len() < 10 {
        return None;
    }
    let service_id = match pdu[0] {
        0x03 => ServiceId::Get,
        0x04 => ServiceId::Set,
        0x05 => ServiceId::Identify,
        0x06 => ServiceId::Hello,
        _ => return None,
    };
    let service_type = match pdu[1] {
        0x00 => ServiceType::Request,
        0x01 => ServiceType::ResponseSuccess,
        0x05 => ServiceType::ResponseError,
        _ => return None,
    };
    let xid = u32::from_be_bytes([pdu[2], pdu[3], pdu[4], pdu[5]]);
    // pdu[6..8] is the "response delay/reserved" field, not inspected here.
    let dcp_data_length = u16::from_be_bytes([pdu[8], pdu[9]]);
    let blocks = &pdu[10..];
    if dcp_data_length as usize > blocks.len() {
        return None;
    }
    Some((Header { service_id, service_type, xid, dcp_data_length }, &blocks[..dcp_data_length as usize]))
}

/// Walk a DCP block list, invoking `f` for each well-formed block. Stops (without error) at the
/// first block whose declared length would run past the end of `blocks` -- the caller already
/// validated the outer `dcp_data_length` against the real payload, so this only guards individual
/// block lengths.
pub fn for_each_block<'a>(blocks: &'a [u8], mut f: impl FnMut(Block<'a>)) {
    let mut pos = 0usize;
    while pos + 4 <= blocks.len() {
        let option = blocks[pos];
        let suboption = blocks[pos + 1];
        let len = u16::from_be_bytes([blocks[pos + 2], blocks[pos + 3]]) as usize;
        let payload_start = pos + 4;
        if payload_start + len > blocks.len() {
            break;
        }
        f(Block { option, suboption, payload: &blocks[payload_start..payload_start + len] });
        // Blocks are padded to an even length.
        pos = payload_start + len + (len % 2);
    }
}

/// `true` iff the destination MAC of a unicast DCP frame matches this device; the DCP multicast
/// identify path is handled separately by the frame classifier and never reaches this check.
pub fn accepts_unicast(dest: EthernetAddress, device_mac: EthernetAddress) -> bool {
    dest == device_mac
}

/// Microsecond response delay an Identify responder should wait before replying, derived from
/// the low 16 bits of the device MAC and the request's `response_delay_factor`. Zero for
/// `factor <= 1` (no randomization requested) and for `factor > 6400` (out of the defined range);
/// otherwise `(mac_low16 mod factor) * 10_000us`.
pub fn response_delay_us(mac: EthernetAddress, factor: u16) -> u32 {
    if factor <= 1 || factor > 6400 {
        return 0;
    }
    (mac.low16() % factor) as u32 * 10_000
}

pub const ETHERTYPE: u16 = ETHERTYPE_PROFINET;
pub use dcp_subframe::{GET_SET, IDENTIFY};

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(low_word: u32) -> EthernetAddress {
        let b = low_word.to_be_bytes();
        EthernetAddress([0, 0, b[0], b[1], b[2], b[3]])
    }

    #[test]
    fn response_delay_matches_reference_table() {
        let step = 10_000;
        let m0 = EthernetAddress([0; 6]);
        for factor in [0u16, 1, 2, 10, 100, 1000, 6400, 6401, 0xffff] {
            assert_eq!(response_delay_us(m0, factor), 0);
        }

        let m1 = mac(1);
        assert_eq!(response_delay_us(m1, 2), 1 * step);
        assert_eq!(response_delay_us(m1, 6400), 1 * step);
        assert_eq!(response_delay_us(m1, 6401), 0);

        let m199 = mac(199);
        assert_eq!(response_delay_us(m199, 100), 99 * step);

        let m255 = mac(255);
        assert_eq!(response_delay_us(m255, 2), 1 * step);
        assert_eq!(response_delay_us(m255, 10), 5 * step);
        assert_eq!(response_delay_us(m255, 100), 55 * step);
        assert_eq!(response_delay_us(m255, 255), 0);
        assert_eq!(response_delay_us(m255, 256), 255 * step);
        assert_eq!(response_delay_us(m255, 6400), 255 * step);
        assert_eq!(response_delay_us(m255, 6401), 0);

        let m256 = mac(256);
        assert_eq!(response_delay_us(m256, 10), 6 * step);
        assert_eq!(response_delay_us(m256, 256), 0);
        assert_eq!(response_delay_us(m256, 257), 256 * step);

        let m512 = mac(512);
        assert_eq!(response_delay_us(m512, 10), 2 * step);
        assert_eq!(response_delay_us(m512, 100), 12 * step);
        assert_eq!(response_delay_us(m512, 1000), 512 * step);
    }

    #[test]
    fn header_with_overrunning_length_is_rejected() {
        // service=Get, type=Request, xid=1, reserved, dcp_data_length=4 but only 2 bytes follow.
        let pdu = [0x03, 0x00, 0x00, 0x00, 0x00, 0x01, 0x04, 0x01, 0x00, 0x04, 0x00, 0x00];
        assert!(parse_header(&pdu).is_none());
    }

    #[test]
    fn header_parses_get_name_request() {
        let pdu = [0x03, 0x00, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x04, 0x02, 0x02, 0x00, 0x00];
        let (header, blocks) = parse_header(&pdu).unwrap();
        assert_eq!(header.service_id, ServiceId::Get);
        assert_eq!(header.service_type, ServiceType::Request);
        assert_eq!(header.xid, 5);
        assert_eq!(blocks, &[0x02, 0x02, 0x00, 0x00]);
    }

    #[test]
    fn for_each_block_yields_options_and_pads_to_even_length() {
        // One block: option=0x02 suboption=0x02 len=3 "abc" (padded odd -> skip 1).
        let blocks = [0x02, 0x02, 0x00, 0x03, b'a', b'b', b'c', 0x00];
        let mut seen = Vec::new();
        for_each_block(&blocks, |b| seen.push((b.option, b.suboption, b.payload.to_vec())));
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].2, b"abc");
    }

    #[test]
    fn unicast_destination_must_match_device_mac() {
        let device = EthernetAddress([0x12, 0x34, 0x00, 0x78, 0x90, 0xab]);
        assert!(accepts_unicast(device, device));
        assert!(!accepts_unicast(EthernetAddress::ZERO, device));
    }
}
