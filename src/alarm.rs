//! Alarm queue and diagnosis-to-alarm-specifier summarization.

use crate::diag::{DiagItem, DiagPayload, Severity, MAINT_DEMANDED_QUALIFIER_MAX, MAINT_DEMANDED_QUALIFIER_MIN, MAINT_REQUIRED_QUALIFIER_MAX, MAINT_REQUIRED_QUALIFIER_MIN, STANDARD_USI_CHANNEL, STANDARD_USI_EXTENDED_CHANNEL, STANDARD_USI_QUALIFIED_CHANNEL};
use crate::error::FullError;
use crate::MAX_ALARMS;
use heapless::Deque;

/// Alarm/event type, carried in the alarm PDU's `AlarmType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmType {
    Diagnosis,
    Process,
    Pull,
    Plug,
    StatusChanged,
    PullModule,
    PlugModule,
}

/// A single queued alarm, as produced by the application or raised internally (e.g. on
/// diagnosis change).
#[derive(Debug, Clone)]
pub struct Alarm {
    pub sequence_number: u16,
    pub alarm_type: AlarmType,
    pub api: u32,
    pub slot: u16,
    pub subslot: u16,
    pub specifier: AlarmSpecifier,
    pub payload_usi: u16,
    pub payload: heapless::Vec<u8, 256>,
}

/// `PNIOStatus`-adjacent alarm specifier bits summarizing the diagnosis state of a subslot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlarmSpecifier {
    pub channel_diagnosis: bool,
    pub manufacturer_diagnosis: bool,
    pub submodule_diagnosis: bool,
    pub ar_diagnosis: bool,
}

/// Bounded FIFO alarm queue, one per AR, capacity [`MAX_ALARMS`].
#[derive(Default)]
pub struct AlarmQueue {
    items: Deque<Alarm, MAX_ALARMS>,
}

impl AlarmQueue {
    pub fn new() -> Self {
        Self { items: Deque::new() }
    }

    /// Push onto the back of the queue. Rejects (leaving the queue unchanged) once at capacity.
    pub fn push(&mut self, alarm: Alarm) -> Result<(), FullError> {
        self.items.push_back(alarm).map_err(|_| FullError::AlarmQueue)
    }

    /// Pop the oldest queued alarm.
    pub fn pop(&mut self) -> Option<Alarm> {
        self.items.pop_front()
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == MAX_ALARMS
    }
}

/// Roll a single [`DiagItem`] into the running [`AlarmSpecifier`]/maintenance-status summary for
/// a subslot, per §4.10. `owning_ar` identifies the AR the caller is summarizing for;
/// `subslot_ar_owner`, if `Some`, identifies the AR actually bound to the subslot.
pub fn add_diag_item_to_summary(owning_ar: u32, subslot_ar_owner: Option<u32>, item: &DiagItem, spec: &mut AlarmSpecifier, maint_status: &mut u32) {
    if item.disappears {
        *spec = AlarmSpecifier::default();
        return;
    }

    let is_channel = matches!(
        item.usi,
        STANDARD_USI_CHANNEL | STANDARD_USI_EXTENDED_CHANNEL | STANDARD_USI_QUALIFIED_CHANNEL
    );
    let is_manufacturer = item.usi < 0x8000
        && !matches!(
            item.usi,
            STANDARD_USI_CHANNEL | STANDARD_USI_EXTENDED_CHANNEL | STANDARD_USI_QUALIFIED_CHANNEL
        );

    spec.channel_diagnosis |= is_channel;
    spec.manufacturer_diagnosis |= is_manufacturer;

    let counts_as_submodule_diag = !item.maintenance_only;
    spec.submodule_diagnosis |= counts_as_submodule_diag;
    spec.ar_diagnosis |= counts_as_submodule_diag && subslot_ar_owner == Some(owning_ar);

    match item.severity {
        Some(Severity::Required) => *maint_status |= 0b01,
        Some(Severity::Demanded) => *maint_status |= 0b10,
        None => {}
    }

    if item.usi == STANDARD_USI_QUALIFIED_CHANNEL {
        if let DiagPayload::Standard { qualifier: Some(q), .. } = &item.payload {
            if (MAINT_REQUIRED_QUALIFIER_MIN..=MAINT_REQUIRED_QUALIFIER_MAX).contains(q) {
                *maint_status |= (1u32 << *q) | 0b01;
            } else if (MAINT_DEMANDED_QUALIFIER_MIN..=MAINT_DEMANDED_QUALIFIER_MAX).contains(q) {
                *maint_status |= (1u32 << *q) | 0b10;
            } else if (27..=31).contains(q) {
                *maint_status |= 1u32 << *q;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::{DiagItem, DiagPayload};

    fn channel_item(disappears: bool) -> DiagItem {
        DiagItem {
            usi: STANDARD_USI_EXTENDED_CHANNEL,
            disappears,
            maintenance_only: false,
            severity: Some(Severity::Required),
            payload: DiagPayload::Standard {
                channel: 1,
                channel_properties: 0,
                ext_error_type: 0,
                ext_add_value: 0,
                qualifier: None,
            },
        }
    }

    #[test]
    fn channel_diag_sets_submodule_and_ar_bits_for_owner() {
        let mut spec = AlarmSpecifier::default();
        let mut maint = 0u32;
        add_diag_item_to_summary(1, Some(1), &channel_item(false), &mut spec, &mut maint);
        assert!(spec.channel_diagnosis);
        assert!(!spec.manufacturer_diagnosis);
        assert!(spec.submodule_diagnosis);
        assert!(spec.ar_diagnosis);
    }

    #[test]
    fn other_ar_owner_clears_ar_diagnosis_only() {
        let mut spec = AlarmSpecifier::default();
        let mut maint = 0u32;
        add_diag_item_to_summary(1, None, &channel_item(false), &mut spec, &mut maint);
        assert!(spec.submodule_diagnosis);
        assert!(!spec.ar_diagnosis);
    }

    #[test]
    fn manufacturer_usi_sets_manufacturer_bit_not_channel() {
        let mut spec = AlarmSpecifier::default();
        let mut maint = 0u32;
        let mut item = channel_item(false);
        item.usi = 0x1234;
        add_diag_item_to_summary(1, Some(1), &item, &mut spec, &mut maint);
        assert!(!spec.channel_diagnosis);
        assert!(spec.manufacturer_diagnosis);
    }

    #[test]
    fn disappearing_clears_all_bits() {
        let mut spec = AlarmSpecifier {
            channel_diagnosis: true,
            manufacturer_diagnosis: true,
            submodule_diagnosis: true,
            ar_diagnosis: true,
        };
        let mut maint = 0u32;
        add_diag_item_to_summary(1, Some(1), &channel_item(true), &mut spec, &mut maint);
        assert_eq!(spec, AlarmSpecifier::default());
    }

    #[test]
    fn queue_rejects_push_past_capacity_and_drains_fifo() {
        let mut q = AlarmQueue::new();
        for i in 0..MAX_ALARMS {
            q.push(Alarm {
                sequence_number: i as u16,
                alarm_type: AlarmType::Process,
                api: 0,
                slot: 0,
                subslot: 0,
                specifier: AlarmSpecifier::default(),
                payload_usi: 0,
                payload: heapless::Vec::new(),
            })
            .unwrap();
        }
        assert_eq!(q.count(), MAX_ALARMS);
        assert!(q.push(Alarm {
            sequence_number: 99,
            alarm_type: AlarmType::Process,
            api: 0,
            slot: 0,
            subslot: 0,
            specifier: AlarmSpecifier::default(),
            payload_usi: 0,
            payload: heapless::Vec::new(),
        })
        .is_err());

        for i in 0..MAX_ALARMS {
            assert_eq!(q.pop().unwrap().sequence_number, i as u16);
        }
        assert!(q.pop().is_none());
        assert_eq!(q.count(), 0);
    }
}
