//! PPM: cyclic data producer (device -> controller).

use crate::error::FullError;
use crate::MAX_FRAME_SIZE;

/// One microsecond expressed in 1/32 ms ticks: `31.25us = 125/4 us`, kept as an integer ratio so
/// the cycle-counter math below never touches floating point.
const US_PER_31_25US_NUM: u64 = 4;
const US_PER_31_25US_DEN: u64 = 125;

/// The cycle counter value a producer/consumer would be emitting at wall-clock time `t_us`, given
/// `cycle_base` (in 1/32 ms units) and a `reduction_ratio` dividing down the base send clock.
pub fn calculate_cyclecounter(t_us: u32, cycle_base: u16, reduction_ratio: u16) -> u16 {
    let group = (cycle_base as u64) * (reduction_ratio as u64).max(1);
    if group == 0 {
        return 0;
    }
    let raw = (t_us as u64 * US_PER_31_25US_NUM) / US_PER_31_25US_DEN;
    (((raw / group) * group) % 0x1_0000) as u16
}

/// The next cycle counter value following `prev`, rounded up to the next multiple of
/// `cycle_base * reduction_ratio`, wrapping modulo 0x10000.
pub fn calculate_next_cyclecounter(prev: u16, cycle_base: u16, reduction_ratio: u16) -> u16 {
    let group = (cycle_base as u64) * (reduction_ratio as u64).max(1);
    if group == 0 {
        return prev.wrapping_add(1);
    }
    let candidate = prev as u64 + 1;
    let next = candidate.div_ceil(group) * group;
    (next % 0x1_0000) as u16
}

/// IO Provider Status, carried alongside the cyclic data of a subslot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Iops {
    #[default]
    Bad,
    Good,
}

/// Cyclic data producer for a single subslot.
///
/// Tracks the running cycle counter and produces frames only while [`Iops::Good`]; otherwise it
/// keeps sending the last-known data tagged with a stale-data marker, matching how a real PPM
/// avoids creating IO gaps just because the application momentarily stopped updating a value.
pub struct Producer {
    pub cycle_base_1_32ms: u16,
    pub reduction_ratio: u16,
    cycle_counter: u16,
    data: heapless::Vec<u8, MAX_FRAME_SIZE>,
    iops: Iops,
    data_is_new: bool,
}

impl Producer {
    pub fn new(cycle_base_1_32ms: u16, reduction_ratio: u16) -> Self {
        Self {
            cycle_base_1_32ms,
            reduction_ratio,
            cycle_counter: 0,
            data: heapless::Vec::new(),
            iops: Iops::Bad,
            data_is_new: false,
        }
    }

    /// Application write: stage new data and mark the producer runnable.
    pub fn set_data_and_iops(&mut self, data: &[u8], iops: Iops) -> Result<(), FullError> {
        self.data.clear();
        self.data.extend_from_slice(data).map_err(|_| FullError::SubslotTable)?;
        self.iops = iops;
        self.data_is_new = true;
        Ok(())
    }

    /// Advance the cycle counter to the next scheduled send slot and return the frame payload to
    /// transmit (data, current cycle counter, IOPS, and whether this is fresh application data).
    pub fn tick(&mut self) -> (&[u8], u16, Iops, bool) {
        self.cycle_counter = calculate_next_cyclecounter(self.cycle_counter, self.cycle_base_1_32ms, self.reduction_ratio);
        let fresh = self.data_is_new;
        self.data_is_new = false;
        (&self.data, self.cycle_counter, self.iops, fresh)
    }

    pub fn cycle_counter(&self) -> u16 {
        self.cycle_counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclecounter_matches_reference_table() {
        assert_eq!(calculate_cyclecounter(0, 1, 1), 0);
        assert_eq!(calculate_cyclecounter(40, 1, 1), 1);
        assert_eq!(calculate_cyclecounter(70, 1, 1), 2);
        assert_eq!(calculate_cyclecounter(80, 2, 1), 2);
        assert_eq!(calculate_cyclecounter(140, 2, 1), 4);
        assert_eq!(calculate_cyclecounter(750, 2, 8), 16);
        assert_eq!(calculate_cyclecounter(1250, 2, 8), 32);
        assert_eq!(calculate_cyclecounter(5000, 32, 4), 128);
        assert_eq!(calculate_cyclecounter(9000, 32, 4), 256);
    }

    #[test]
    fn next_cyclecounter_rounds_up_and_wraps() {
        assert_eq!(calculate_next_cyclecounter(0, 1, 1), 1);
        assert_eq!(calculate_next_cyclecounter(0xffff, 1, 1), 0);
        assert_eq!(calculate_next_cyclecounter(0, 2, 1), 2);
        assert_eq!(calculate_next_cyclecounter(1, 2, 1), 2);
        assert_eq!(calculate_next_cyclecounter(2, 2, 1), 4);
        assert_eq!(calculate_next_cyclecounter(3, 2, 1), 4);
    }

    #[test]
    fn producer_emits_staged_data_once() {
        let mut p = Producer::new(1, 1);
        p.set_data_and_iops(&[0x23], Iops::Good).unwrap();
        let (data, counter, iops, fresh) = p.tick();
        assert_eq!(data, &[0x23]);
        assert_eq!(counter, 1);
        assert_eq!(iops, Iops::Good);
        assert!(fresh);

        let (_, _, _, fresh_again) = p.tick();
        assert!(!fresh_again);
    }
}
