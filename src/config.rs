//! Device configuration, enumerated per §6: network, identity, timing, I&M, storage, diagnosis
//! and LLDP settings, plus the validation that [`crate::net::Net::new`] runs over all of it
//! before the device is allowed to come up.

use crate::error::ValidationError;
use crate::ethernet::Ipv4Address;
use crate::{cmina, MAX_PHYSICAL_PORTS};

/// `min_device_interval` is carried in 1/32 ms units and must lie in this range.
pub const MIN_DEVICE_INTERVAL_MIN: u16 = 1;
pub const MIN_DEVICE_INTERVAL_MAX: u16 = 4096;

/// I&M1..4 are free-form strings up to this many bytes.
pub const IM_STRING_CAP: usize = 54;

/// Network-facing configuration: which interface(s) to bind and the initial IP suite.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub if_name: heapless::String<16>,
    pub main_netif_name: heapless::String<16>,
    pub physical_ports: heapless::Vec<heapless::String<16>, MAX_PHYSICAL_PORTS>,
    pub send_hello: bool,
    pub dhcp_enable: bool,
    pub ip_addr: Ipv4Address,
    pub ip_mask: Ipv4Address,
    pub ip_gateway: Ipv4Address,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            if_name: heapless::String::new(),
            main_netif_name: heapless::String::new(),
            physical_ports: heapless::Vec::new(),
            send_hello: true,
            dhcp_enable: false,
            ip_addr: Ipv4Address::UNSPECIFIED,
            ip_mask: Ipv4Address::UNSPECIFIED,
            ip_gateway: Ipv4Address::UNSPECIFIED,
        }
    }
}

/// Device identity, as reported by I&M0 and the DCP identify response.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub vendor_id_hi: u8,
    pub vendor_id_lo: u8,
    pub device_id_hi: u8,
    pub device_id_lo: u8,
    pub oem_device_id_hi: u8,
    pub oem_device_id_lo: u8,
    pub station_name: heapless::String<240>,
    pub product_name: heapless::String<25>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            vendor_id_hi: 0,
            vendor_id_lo: 0,
            device_id_hi: 0,
            device_id_lo: 0,
            oem_device_id_hi: 0,
            oem_device_id_lo: 0,
            station_name: heapless::String::new(),
            product_name: heapless::String::new(),
        }
    }
}

/// Timing parameters that govern the cyclic data and scheduler clock.
#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    /// Shortest cyclic data interval this device will accept, in 1/32 ms units (1..4096).
    pub min_device_interval: u16,
    /// The PAL's nominal tick period, in microseconds, that drives `handle_periodic`.
    pub tick_us: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self { min_device_interval: 32, tick_us: 1000 }
    }
}

/// I&M0 (fixed-format identification & maintenance block) plus the free-form I&M1..4 strings.
#[derive(Debug, Clone)]
pub struct ImConfig {
    pub im_vendor_id: u16,
    pub im_hardware_revision: u16,
    pub im_software_revision: (u8, u8, u8),
    pub im_revision_counter: u16,
    pub im_profile_id: u16,
    pub im_profile_specific_type: u16,
    pub im_version: (u8, u8),
    /// Which of I&M1..4 are actually present, restricted to bits {1,2,3,4}.
    pub im_supported: u8,
    pub im1: heapless::String<IM_STRING_CAP>,
    pub im2: heapless::String<IM_STRING_CAP>,
    pub im3: heapless::String<IM_STRING_CAP>,
    pub im4: heapless::String<IM_STRING_CAP>,
}

impl Default for ImConfig {
    fn default() -> Self {
        Self {
            im_vendor_id: 0,
            im_hardware_revision: 0,
            im_software_revision: (0, 0, 0),
            im_revision_counter: 0,
            im_profile_id: 0,
            im_profile_specific_type: 0,
            im_version: (1, 1),
            im_supported: 0,
            im1: heapless::String::new(),
            im2: heapless::String::new(),
            im3: heapless::String::new(),
            im4: heapless::String::new(),
        }
    }
}

impl ImConfig {
    /// The 22-byte `tag_location` field carried within I&M1, mirrored by
    /// [`crate::snmp::set_system_location`]. I&M1's layout is `tag_function[32] + tag_location[22]`;
    /// this stack only exposes the location half to SNMP, so `im1` here already holds just that.
    pub fn tag_location(&self) -> &str {
        &self.im1
    }
}

/// Where persisted blobs (station name cache, IP suite cache, I&M, diagnosis, sysLocation, ...)
/// live on the PAL's file backend.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub file_directory: heapless::String<64>,
}

/// Diagnosis-store behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosisConfig {
    /// Whether `std_add` without an explicit qualifier still uses the qualified USI (0x8003)
    /// instead of the plain extended one (0x8002).
    pub use_qualified_diagnosis: bool,
}

/// Per-port LLDP announcement settings.
#[derive(Debug, Clone)]
pub struct LldpPortConfig {
    pub port_id: heapless::String<240>,
    pub rtclass_2_status: u32,
    pub rtclass_3_status: u32,
    pub autoneg_supported: bool,
    pub autoneg_enabled: bool,
    pub autoneg_advertised_caps: u16,
    pub phy_type: u16,
    pub mau_type: u16,
}

impl Default for LldpPortConfig {
    fn default() -> Self {
        Self {
            port_id: heapless::String::new(),
            rtclass_2_status: 0,
            rtclass_3_status: 0,
            autoneg_supported: false,
            autoneg_enabled: false,
            autoneg_advertised_caps: 0,
            phy_type: 0,
            mau_type: 0,
        }
    }
}

/// LLDP-wide settings: a chassis id plus each port's own [`LldpPortConfig`] and a shared TTL.
#[derive(Debug, Clone, Default)]
pub struct LldpConfig {
    pub chassis_id: heapless::String<240>,
    pub ttl_seconds: u16,
    pub ports: heapless::Vec<LldpPortConfig, MAX_PHYSICAL_PORTS>,
}

/// The full device configuration.
#[derive(Debug, Clone, Default)]
pub struct NetConfig {
    pub network: NetworkConfig,
    pub identity: IdentityConfig,
    pub timing: TimingConfig,
    pub im: ImConfig,
    pub storage: StorageConfig,
    pub diagnosis: DiagnosisConfig,
    pub lldp: LldpConfig,
}

impl NetConfig {
    /// Validate every field this crate's own modules impose a constraint on. Run once at
    /// [`crate::net::Net::new`]; a config that fails this can never be partially applied.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !cmina::name_valid(&self.identity.station_name) {
            return Err(ValidationError::BadStationName);
        }
        if !cmina::netmask_valid(self.network.ip_mask) {
            return Err(ValidationError::BadNetmask);
        }
        if !cmina::ip_valid(self.network.ip_addr, self.network.ip_mask) {
            return Err(ValidationError::BadIpSuite);
        }
        if !cmina::gateway_valid(self.network.ip_gateway, self.network.ip_addr, self.network.ip_mask) {
            return Err(ValidationError::BadGateway);
        }
        if !(MIN_DEVICE_INTERVAL_MIN..=MIN_DEVICE_INTERVAL_MAX).contains(&self.timing.min_device_interval) {
            return Err(ValidationError::OutOfRange("min_device_interval"));
        }
        if self.timing.tick_us == 0 {
            return Err(ValidationError::OutOfRange("tick_us"));
        }
        if self.im.im_supported & !0b0001_1110 != 0 {
            return Err(ValidationError::OutOfRange("im_supported"));
        }
        if self.network.physical_ports.len() > MAX_PHYSICAL_PORTS {
            return Err(ValidationError::OutOfRange("physical_ports"));
        }
        Ok(())
    }
}
