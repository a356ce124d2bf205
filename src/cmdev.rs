//! CMDEV: the AR (Application Relation) lifecycle state machine.

use crate::error::{FatalError, ProtocolError};
use crate::AR_TYPE_IOCAR_SINGLE;

/// Observable state of a bound AR, matching the callback sequence an application sees:
/// `Startup` (on CONNECT), `Prmend`, `Applrdy`, `Data` (first good cyclic frame), `Abort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArState {
    PowerOn,
    WaitConnectCnf,
    WaitPrmEnd,
    WaitApplReady,
    WaitApplReadyCnf,
    Data,
    Abort,
}

/// Events the state machine reacts to. Anything not handled by the current state's transition
/// table is rejected with [`FatalError::BadCmdevState`] (STARTUP/PRMEND/APPLRDY/DATA/ABORT are the
/// resulting observable callbacks, not the event names themselves).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArEvent {
    ConnectInd,
    ConnectCnfOk,
    PrmEndInd,
    ApplicationReady,
    ApplReadyCnf,
    GoodCyclicFrame,
    ReleaseInd,
    Timeout,
    Fatal,
}

/// Application-visible callback fired on every accepted state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCallback {
    Startup,
    PrmEnd,
    ApplReady,
    Data,
    Abort,
}

/// A bound controller session. Expected configuration (slot/subslot idents), CPM/PPM bindings,
/// alarm queue and diagnosis store live alongside this in the owning subslot/AR tables; this
/// struct carries only the lifecycle-relevant fields.
pub struct Ar {
    pub arep: u32,
    pub state: ArState,
    pub connect_time_us: u32,
}

impl Ar {
    pub fn new(arep: u32, now_us: u32) -> Self {
        Self { arep, state: ArState::PowerOn, connect_time_us: now_us }
    }

    /// Drive one event through the state machine. Returns the callback to deliver to the
    /// application, if the transition is accepted and produces one. The state update happens
    /// before this returns, so re-entrant calls the application makes from inside the callback
    /// observe the new state, never the old one.
    pub fn handle_event(&mut self, event: ArEvent) -> Result<Option<StateCallback>, FatalError> {
        use ArEvent::*;
        use ArState::*;

        let (next, callback) = match (self.state, event) {
            (PowerOn, ConnectInd) => (WaitConnectCnf, Some(StateCallback::Startup)),
            (WaitConnectCnf, ConnectCnfOk) => (WaitPrmEnd, None),
            (WaitPrmEnd, PrmEndInd) => (WaitApplReady, Some(StateCallback::PrmEnd)),
            (WaitApplReady, ApplicationReady) => (WaitApplReadyCnf, Some(StateCallback::ApplReady)),
            (WaitApplReadyCnf, ApplReadyCnf) => (WaitApplReadyCnf, None),
            (WaitApplReadyCnf, GoodCyclicFrame) => (Data, Some(StateCallback::Data)),
            (Data, GoodCyclicFrame) => (Data, None),
            (_, ReleaseInd) | (_, Timeout) | (_, Fatal) if self.state != Abort => {
                (Abort, Some(StateCallback::Abort))
            }
            (Abort, _) => return Err(FatalError::BadCmdevState),
            _ => return Err(FatalError::BadCmdevState),
        };

        self.state = next;
        Ok(callback)
    }
}

/// Module/submodule/status-type direction, used by [`calc_direction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleDirection {
    NoIo,
    Input,
    Output,
    Io,
}

/// The half of a cyclic exchange a status byte belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusType {
    Iops,
    Iocs,
}

/// Subslot data direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Derive the direction a status byte (IOPS or IOCS) applies to, given the module's declared
/// direction. `NO_IO` and `INPUT` modules only accept `IOPS -> INPUT` or `IOCS(as an output ack)
/// -> INPUT`; `OUTPUT` modules only accept the mirror image; `IO` modules accept all four
/// combinations with IOCS always resolving to INPUT and IOPS always resolving to OUTPUT.
pub fn calc_direction(module_dir: ModuleDirection, status_type: StatusType) -> Result<Direction, ProtocolError> {
    use ModuleDirection::*;
    use StatusType::*;

    match (module_dir, status_type) {
        (NoIo, Iops) | (Input, Iops) => Ok(Direction::Input),
        (NoIo, Iocs) | (Input, Iocs) => Ok(Direction::Input),
        (Output, Iocs) => Ok(Direction::Output),
        (Output, Iops) => Ok(Direction::Output),
        (Io, Iocs) => Ok(Direction::Input),
        (Io, Iops) => Ok(Direction::Output),
    }
}

/// `true` iff every byte of `buf` is zero.
pub fn check_zero(buf: &[u8]) -> bool {
    buf.iter().all(|&b| b == 0)
}

/// `true` iff `s` is non-empty and every byte is a printable ASCII character (`0x20..=0x7E`).
pub fn check_vstring(s: &[u8]) -> bool {
    !s.is_empty() && s.iter().all(|&b| (0x20..=0x7e).contains(&b))
}

/// `true` iff the byte ranges `[a, a+len_a)` and `[b, b+len_b)` are disjoint. A zero-length range
/// never straddles anything. Symmetric in its two arguments.
pub fn no_straddle(start_a: u32, len_a: u32, start_b: u32, len_b: u32) -> bool {
    if len_a == 0 || len_b == 0 {
        return true;
    }
    let end_a = start_a + len_a;
    let end_b = start_b + len_b;
    end_a <= start_b || end_b <= start_a
}

/// Only `IOCAR_SINGLE` (0x01) is an acceptable AR type in this profile.
pub fn ar_type_valid(ar_type: u16) -> bool {
    ar_type == AR_TYPE_IOCAR_SINGLE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_lifecycle_emits_expected_callbacks() {
        let mut ar = Ar::new(1, 0);
        assert_eq!(ar.handle_event(ArEvent::ConnectInd).unwrap(), Some(StateCallback::Startup));
        assert_eq!(ar.handle_event(ArEvent::ConnectCnfOk).unwrap(), None);
        assert_eq!(ar.handle_event(ArEvent::PrmEndInd).unwrap(), Some(StateCallback::PrmEnd));
        assert_eq!(ar.handle_event(ArEvent::ApplicationReady).unwrap(), Some(StateCallback::ApplReady));
        assert_eq!(ar.handle_event(ArEvent::ApplReadyCnf).unwrap(), None);
        assert_eq!(ar.handle_event(ArEvent::GoodCyclicFrame).unwrap(), Some(StateCallback::Data));
        assert_eq!(ar.state, ArState::Data);
        assert_eq!(ar.handle_event(ArEvent::GoodCyclicFrame).unwrap(), None); // stays in DATA
        assert_eq!(ar.handle_event(ArEvent::ReleaseInd).unwrap(), Some(StateCallback::Abort));
        assert_eq!(ar.state, ArState::Abort);
    }

    #[test]
    fn release_from_any_non_terminal_state_aborts() {
        let mut ar = Ar::new(1, 0);
        ar.handle_event(ArEvent::ConnectInd).unwrap();
        assert_eq!(ar.handle_event(ArEvent::ReleaseInd).unwrap(), Some(StateCallback::Abort));
    }

    #[test]
    fn abort_is_terminal() {
        let mut ar = Ar::new(1, 0);
        ar.handle_event(ArEvent::ConnectInd).unwrap();
        ar.handle_event(ArEvent::ReleaseInd).unwrap();
        assert!(ar.handle_event(ArEvent::PrmEndInd).is_err());
        assert!(ar.handle_event(ArEvent::Timeout).is_err());
    }

    #[test]
    fn out_of_order_event_rejected() {
        let mut ar = Ar::new(1, 0);
        assert!(ar.handle_event(ArEvent::PrmEndInd).is_err());
    }

    #[test]
    fn direction_table_matches_module_kind() {
        assert_eq!(calc_direction(ModuleDirection::NoIo, StatusType::Iops).unwrap(), Direction::Input);
        assert_eq!(calc_direction(ModuleDirection::NoIo, StatusType::Iocs).unwrap(), Direction::Input);
        assert_eq!(calc_direction(ModuleDirection::Input, StatusType::Iops).unwrap(), Direction::Input);
        assert_eq!(calc_direction(ModuleDirection::Output, StatusType::Iocs).unwrap(), Direction::Output);
        assert_eq!(calc_direction(ModuleDirection::Output, StatusType::Iops).unwrap(), Direction::Output);
        assert_eq!(calc_direction(ModuleDirection::Io, StatusType::Iocs).unwrap(), Direction::Input);
        assert_eq!(calc_direction(ModuleDirection::Io, StatusType::Iops).unwrap(), Direction::Output);
    }

    #[test]
    fn zero_and_vstring_checks() {
        assert!(check_zero(&[0, 0, 0]));
        assert!(!check_zero(&[0, 1, 0]));
        assert!(check_zero(&[]));

        assert!(check_vstring(b"hello world"));
        assert!(!check_vstring(b""));
        assert!(!check_vstring(&[0x1f]));
        assert!(!check_vstring(&[0x7f]));
    }

    #[test]
    fn no_straddle_detects_overlap_and_is_symmetric() {
        assert!(no_straddle(0, 4, 4, 4));
        assert!(!no_straddle(0, 5, 4, 4));
        assert!(no_straddle(10, 0, 10, 5)); // zero-length vacuously disjoint
        assert!(no_straddle(4, 4, 0, 4) == no_straddle(0, 4, 4, 4));
    }

    #[test]
    fn ar_type_only_accepts_single() {
        assert!(ar_type_valid(0x01));
        assert!(!ar_type_valid(0x02));
        assert!(!ar_type_valid(0x00));
    }
}
