//! Diagnosis store: standard (channel) and USI (manufacturer) diagnosis items per subslot.

use crate::MAX_DIAG_ITEMS_PER_SUBSLOT;

/// Standard channel diagnosis, carrying only a channel/extended error type.
pub const STANDARD_USI_CHANNEL: u16 = 0x8000;
/// Standard channel diagnosis with an extended error type and value.
pub const STANDARD_USI_EXTENDED_CHANNEL: u16 = 0x8002;
/// Standard channel diagnosis additionally carrying a qualifier.
pub const STANDARD_USI_QUALIFIED_CHANNEL: u16 = 0x8003;

pub const MAINT_REQUIRED_QUALIFIER_MIN: u32 = 7;
pub const MAINT_REQUIRED_QUALIFIER_MAX: u32 = 16;
pub const MAINT_DEMANDED_QUALIFIER_MIN: u32 = 17;
pub const MAINT_DEMANDED_QUALIFIER_MAX: u32 = 26;

/// Direction a channel diagnosis applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelDirection {
    Input,
    Output,
    Bidirectional,
}

/// `MAINT_STATUS` severity derived from a channel diagnosis's properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Required,
    Demanded,
}

/// Identifies which subslot/channel/grouping a diagnosis operation targets. Every field must
/// match exactly for an update/remove to find its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagSource {
    pub api: u32,
    pub slot: u16,
    pub subslot: u16,
    pub channel: u16,
    pub ch_grouping: u16,
    pub ch_direction: ChannelDirection,
}

/// The uniqueness key for a diagnosis item: either the full channel key (for standard USIs) or
/// just the USI (for manufacturer entries).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiagKey {
    Channel {
        channel: u16,
        ch_direction_is_input: bool,
        ch_grouping: u16,
        ch_error_type: u16,
        ext_error_type: u16,
    },
    Usi(u16),
}

/// The payload shape of a diagnosis item: either the standard channel fields, or an opaque
/// manufacturer-specific blob (USI < 0x8000).
#[derive(Debug, Clone)]
pub enum DiagPayload {
    Standard {
        channel: u16,
        channel_properties: u16,
        ext_error_type: u16,
        ext_add_value: u32,
        qualifier: Option<u32>,
    },
    Manufacturer(heapless::Vec<u8, 64>),
}

#[derive(Debug, Clone)]
pub struct DiagItem {
    pub usi: u16,
    pub disappears: bool,
    pub maintenance_only: bool,
    pub severity: Option<Severity>,
    pub payload: DiagPayload,
}

struct Entry {
    source: DiagSource,
    key: DiagKey,
    item: DiagItem,
}

/// Per-subslot diagnosis container: a bounded set of [`DiagItem`]s keyed by channel identity (for
/// standard USIs) or raw USI (for manufacturer entries). Adding an existing key updates in place.
#[derive(Default)]
pub struct DiagStore {
    entries: heapless::Vec<Entry, MAX_DIAG_ITEMS_PER_SUBSLOT>,
}

impl DiagStore {
    pub fn new() -> Self {
        Self { entries: heapless::Vec::new() }
    }

    fn find_mut(&mut self, source: &DiagSource, key: &DiagKey) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| &e.source == source && &e.key == key)
    }

    fn upsert(&mut self, source: DiagSource, key: DiagKey, item: DiagItem) -> Result<(), ()> {
        if let Some(entry) = self.find_mut(&source, &key) {
            entry.item = item;
            return Ok(());
        }
        self.entries.push(Entry { source, key, item }).map_err(|_| ())
    }

    fn remove_key(&mut self, source: &DiagSource, key: &DiagKey) -> Result<(), ()> {
        let pos = self.entries.iter().position(|e| &e.source == source && &e.key == key).ok_or(())?;
        self.entries.remove(pos);
        Ok(())
    }

    /// Typed standard-diagnosis add/update: the USI is inferred from `severity`/`qualifier`
    /// (`QUALIFIED` -> 0x8003, otherwise 0x8002).
    pub fn std_add(
        &mut self,
        source: DiagSource,
        severity: Option<Severity>,
        ch_error_type: u16,
        ext_error_type: u16,
        ext_add_value: u32,
        qualifier: Option<u32>,
    ) -> Result<(), ()> {
        let usi = if qualifier.is_some() { STANDARD_USI_QUALIFIED_CHANNEL } else { STANDARD_USI_EXTENDED_CHANNEL };
        let key = DiagKey::Channel {
            channel: source.channel,
            ch_direction_is_input: source.ch_direction == ChannelDirection::Input,
            ch_grouping: source.ch_grouping,
            ch_error_type,
            ext_error_type,
        };
        let item = DiagItem {
            usi,
            disappears: false,
            maintenance_only: false,
            severity,
            payload: DiagPayload::Standard {
                channel: source.channel,
                channel_properties: ch_error_type,
                ext_error_type,
                ext_add_value,
                qualifier,
            },
        };
        self.upsert(source, key, item)
    }

    pub fn std_update(
        &mut self,
        source: DiagSource,
        severity: Option<Severity>,
        ch_error_type: u16,
        ext_error_type: u16,
        ext_add_value: u32,
        qualifier: Option<u32>,
    ) -> Result<(), ()> {
        self.std_add(source, severity, ch_error_type, ext_error_type, ext_add_value, qualifier)
    }

    pub fn std_remove(&mut self, source: DiagSource, ch_error_type: u16, ext_error_type: u16) -> Result<(), ()> {
        let key = DiagKey::Channel {
            channel: source.channel,
            ch_direction_is_input: source.ch_direction == ChannelDirection::Input,
            ch_grouping: source.ch_grouping,
            ch_error_type,
            ext_error_type,
        };
        self.remove_key(&source, &key)
    }

    /// Manufacturer-specific diagnosis add/update. `usi` must be `< 0x8000`.
    pub fn usi_add(&mut self, source: DiagSource, usi: u16, data: &[u8]) -> Result<(), ()> {
        if usi >= 0x8000 {
            return Err(());
        }
        let mut blob = heapless::Vec::new();
        blob.extend_from_slice(data).map_err(|_| ())?;
        let item = DiagItem {
            usi,
            disappears: false,
            maintenance_only: false,
            severity: None,
            payload: DiagPayload::Manufacturer(blob),
        };
        self.upsert(source, DiagKey::Usi(usi), item)
    }

    pub fn usi_update(&mut self, source: DiagSource, usi: u16, data: &[u8]) -> Result<(), ()> {
        self.usi_add(source, usi, data)
    }

    pub fn usi_remove(&mut self, source: DiagSource, usi: u16) -> Result<(), ()> {
        if usi >= 0x8000 {
            return Err(());
        }
        self.remove_key(&source, &DiagKey::Usi(usi))
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> DiagSource {
        DiagSource {
            api: 0,
            slot: 1,
            subslot: 1,
            channel: 3,
            ch_grouping: 0,
            ch_direction: ChannelDirection::Input,
        }
    }

    #[test]
    fn add_update_remove_round_trip() {
        let mut store = DiagStore::new();
        let src = source();
        assert!(store.std_add(src, Some(Severity::Required), 1, 0x10, 0, None).is_ok());
        assert_eq!(store.count(), 1);
        assert!(store.std_update(src, Some(Severity::Demanded), 1, 0x10, 99, None).is_ok());
        assert_eq!(store.count(), 1); // update in place, no growth
        assert!(store.std_remove(src, 1, 0x10).is_ok());
        assert_eq!(store.count(), 0);
        assert!(store.std_remove(src, 1, 0x10).is_err());
    }

    #[test]
    fn mismatched_source_field_fails_remove() {
        let mut store = DiagStore::new();
        let src = source();
        store.std_add(src, None, 1, 0x10, 0, None).unwrap();
        let mut other = src;
        other.channel = 4;
        assert!(store.std_remove(other, 1, 0x10).is_err());
    }

    #[test]
    fn usi_must_be_below_0x8000() {
        let mut store = DiagStore::new();
        assert!(store.usi_add(source(), 0x9000, &[1, 2, 3]).is_err());
        assert!(store.usi_add(source(), 0x1234, &[1, 2, 3]).is_ok());
    }
}
