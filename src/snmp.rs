//! SNMP adapter: shapes LLDP neighbour data and the system location string for the standard
//! LLDP-MIB / physical-topology MIB objects. This module never speaks SNMP wire format itself
//! (no ASN.1 BER encoder lives here) -- it only produces the field values an SNMP agent sitting
//! on top of this stack would serialize into `OCTET STRING`/`BITS` values.

use crate::filestore::FileBlob;
use crate::lldp::{ManagementAddress, PeerInfo, PhyConfig};

/// Longest I&M1 `tag_location` mirror: the GSDML-defined field is a fixed 22 ASCII bytes.
pub const IM1_LOCATION_LEN: usize = 22;

/// `ManAddress`, RFC 2578 7.7 clause 3: the encoded `OCTET STRING` is the address's own length
/// byte followed by the subtype and raw address bytes -- i.e. the same on-the-wire layout LLDP
/// itself uses for the management-address TLV payload, minus the trailing interface/OID fields.
#[derive(Debug, Clone, Copy)]
pub struct ManagementAddressOctets {
    pub subtype: u8,
    /// `[len][address bytes...]`, where `len` counts the address bytes only (not itself).
    pub value: [u8; 32],
    pub len: u8,
}

/// Build the SNMP `ManAddress` `OCTET STRING` encoding for one [`ManagementAddress`]. Returns
/// `None` if the LLDP data was never populated.
pub fn management_address(addr: &ManagementAddress) -> Option<ManagementAddressOctets> {
    if !addr.is_valid {
        return None;
    }
    let mut value = [0u8; 32];
    value[0] = addr.len;
    value[1..1 + addr.len as usize].copy_from_slice(&addr.value[..addr.len as usize]);
    Some(ManagementAddressOctets { subtype: addr.subtype, value, len: addr.len + 1 })
}

/// `TruthValue` (RFC 2579): `1` for true, `2` for false.
fn truth_value(b: bool) -> u8 {
    if b {
        1
    } else {
        2
    }
}

/// RFC 1906 `BITS` encoding: bit 0 is the most significant bit of the first octet. An IEEE
/// `autonegotiation_advertised_capabilities` register has the opposite convention (bit 0 is the
/// least significant bit of the low byte), so each byte of the register is bit-reversed to land
/// in `BITS` order.
fn reverse_bits8(b: u8) -> u8 {
    b.reverse_bits()
}

/// Link status shaped for the physical-topology MIB's `LinkStatus` group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatus {
    pub auto_neg_supported: u8,
    pub auto_neg_enabled: u8,
    pub auto_neg_advertised_cap: [u8; 2],
    pub oper_mau_type: u16,
}

/// Convert the raw LLDP PHY config into the `BITS`/`TruthValue`-shaped [`LinkStatus`].
pub fn link_status(phy: &PhyConfig) -> LinkStatus {
    let cap = phy.advertised_capabilities;
    let low = (cap & 0xff) as u8;
    let high = (cap >> 8) as u8;
    LinkStatus {
        auto_neg_supported: truth_value(phy.autonegotiation_supported),
        auto_neg_enabled: truth_value(phy.autonegotiation_enabled),
        auto_neg_advertised_cap: [reverse_bits8(low), reverse_bits8(high)],
        oper_mau_type: phy.operational_mau_type,
    }
}

/// Convenience wrapper reading both address and link status out of a stored peer record.
pub fn peer_management_address(peer: &PeerInfo) -> Option<ManagementAddressOctets> {
    management_address(&peer.management_address)
}

pub fn peer_link_status(peer: &PeerInfo) -> LinkStatus {
    link_status(&peer.phy_config)
}

const SYSLOCATION_MAGIC: [u8; 4] = *b"SLOC";
const SYSLOCATION_VERSION: u32 = 1;
const SYSLOCATION_CAP: usize = 255;

/// `sysLocation`, persisted separately from I&M1's shorter `tag_location`. A freshly set value
/// mirrors its first [`IM1_LOCATION_LEN`] bytes into I&M1 (see [`set_system_location`]); loading
/// falls back to whatever is in I&M1 if the file itself is missing or unreadable.
#[derive(Debug, Clone, Default)]
pub struct SystemLocation {
    pub string: heapless::String<SYSLOCATION_CAP>,
}

impl FileBlob for SystemLocation {
    const MAGIC: [u8; 4] = SYSLOCATION_MAGIC;
    const VERSION: u32 = SYSLOCATION_VERSION;

    fn to_bytes(&self) -> Vec<u8> {
        self.string.as_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let s = core::str::from_utf8(bytes).ok()?;
        let mut string = heapless::String::new();
        string.push_str(s).ok()?;
        Some(Self { string })
    }
}

/// Load the persisted `sysLocation`. If no file exists (or it fails to parse), fall back to
/// `im1_location` -- the I&M1 `tag_location` field, which every device has regardless of whether
/// `set_system_location` was ever called -- truncated or space-padded to exactly
/// [`IM1_LOCATION_LEN`] chars, matching I&M1's fixed-width field.
pub fn get_system_location(
    pal: &impl crate::pal::Pal,
    directory: &str,
    im1_location: &str,
) -> SystemLocation {
    match crate::filestore::load::<SystemLocation>(pal, directory, FILENAME_SNMP_SYSLOCATION) {
        Ok(loc) => loc,
        Err(_) => {
            let truncated = &im1_location.as_bytes()[..im1_location.len().min(IM1_LOCATION_LEN)];
            let truncated = core::str::from_utf8(truncated).unwrap_or("");
            let mut string = heapless::String::new();
            let _ = string.push_str(truncated);
            for _ in truncated.len()..IM1_LOCATION_LEN {
                let _ = string.push(' ');
            }
            SystemLocation { string }
        }
    }
}

pub const FILENAME_SNMP_SYSLOCATION: &str = "pf_snmp_syslocation.bin";

/// Persist `location` as `sysLocation` and return the (possibly truncated) mirror that belongs in
/// I&M1's 22-byte `tag_location` field.
pub fn set_system_location(
    pal: &mut impl crate::pal::Pal,
    directory: &str,
    location: &SystemLocation,
) -> Result<heapless::String<IM1_LOCATION_LEN>, crate::error::TransientError> {
    crate::filestore::save(pal, directory, FILENAME_SNMP_SYSLOCATION, location)?;
    let mut mirror = heapless::String::new();
    let truncated = &location.string.as_bytes()[..location.string.len().min(IM1_LOCATION_LEN)];
    let truncated = core::str::from_utf8(truncated).unwrap_or("");
    let _ = mirror.push_str(truncated);
    Ok(mirror)
}
