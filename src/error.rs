//! Stack-wide error types.

use core::fmt;

/// Top level error returned by the public API of this crate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// A value failed validation (bad station name, netmask, IP suite, record index, ...).
    Validation(ValidationError),
    /// A received frame or request violated the protocol (bad AR type, cycle counter in the
    /// forbidden zone, truncated TLVs, ...).
    Protocol(ProtocolError),
    /// The requested item does not exist.
    NotFound(NotFoundError),
    /// A fixed capacity table or queue has no room left.
    Full(FullError),
    /// An operation that can be retried by the application failed transiently.
    Transient(TransientError),
    /// An unrecoverable internal condition. The offending AR is aborted, the device keeps
    /// running.
    Fatal(FatalError),
}

/// Validation failures, surfaced only through a return value or application callback.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Station name does not meet the DNS-label-like grammar required by CMINA.
    BadStationName,
    /// Netmask is not a contiguous run of leading one bits.
    BadNetmask,
    /// IP address/netmask combination is forbidden (loopback, multicast, host all-zero, ...).
    BadIpSuite,
    /// Gateway is neither `0.0.0.0` nor on the configured subnet.
    BadGateway,
    /// A record read/write index is outside of any known range.
    UnknownRecordIndex(u16),
    /// A configuration value is out of its allowed range.
    OutOfRange(&'static str),
}

/// Errors that cause a frame to be dropped or an AR to be aborted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame was truncated, had a bad length field, or otherwise could not be parsed.
    Malformed,
    /// AR type in a CONNECT request is not `IOCAR_SINGLE`.
    BadArType,
    /// Received cycle counter fell in the forbidden zone relative to the last accepted one.
    CycleCounterRejected,
    /// IOPS/IOCS direction combination is not permitted for the module's declared direction.
    BadDirection,
}

/// The requested item could not be located.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    /// No diagnosis entry matches the given source/USI.
    DiagEntry,
    /// The persisted file does not exist, or has a bad magic/version preamble.
    File,
    /// No AR is currently bound.
    Ar,
}

/// A fixed capacity table/queue rejected an insert.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FullError {
    /// The per-AR alarm queue is at `MAX_ALARMS`.
    AlarmQueue,
    /// The scheduler's job table has no free slot.
    Scheduler,
    /// The subslot table has no free slot for a new plug.
    SubslotTable,
}

/// Failures that the application may retry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransientError {
    /// Writing a blob to the file store failed (disk full, permissions, ...).
    FileSave,
}

/// Unrecoverable conditions that abort the active AR but never the device process.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FatalError {
    /// The scheduler's internal bookkeeping is inconsistent.
    SchedulerCorrupt,
    /// CMDEV reached a state that has no valid transition for the received event.
    BadCmdevState,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(e) => write!(f, "validation error: {e}"),
            Error::Protocol(e) => write!(f, "protocol error: {e}"),
            Error::NotFound(e) => write!(f, "not found: {e}"),
            Error::Full(e) => write!(f, "table full: {e}"),
            Error::Transient(e) => write!(f, "transient error: {e}"),
            Error::Fatal(e) => write!(f, "fatal error: {e}"),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::BadStationName => f.write_str("station name is not a valid DNS label sequence"),
            ValidationError::BadNetmask => f.write_str("netmask is not a contiguous prefix mask"),
            ValidationError::BadIpSuite => f.write_str("IP address is forbidden for this netmask"),
            ValidationError::BadGateway => f.write_str("gateway is not on the local subnet"),
            ValidationError::UnknownRecordIndex(idx) => write!(f, "record index {idx:#06x} is not supported"),
            ValidationError::OutOfRange(what) => write!(f, "{what} is out of range"),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Malformed => f.write_str("malformed frame"),
            ProtocolError::BadArType => f.write_str("AR type is not IOCAR_SINGLE"),
            ProtocolError::CycleCounterRejected => f.write_str("cycle counter in forbidden zone"),
            ProtocolError::BadDirection => f.write_str("IOPS/IOCS direction not permitted"),
        }
    }
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundError::DiagEntry => f.write_str("no matching diagnosis entry"),
            NotFoundError::File => f.write_str("file absent or has a bad preamble"),
            NotFoundError::Ar => f.write_str("no AR is bound"),
        }
    }
}

impl fmt::Display for FullError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FullError::AlarmQueue => f.write_str("alarm queue is full"),
            FullError::Scheduler => f.write_str("scheduler table is full"),
            FullError::SubslotTable => f.write_str("subslot table is full"),
        }
    }
}

impl fmt::Display for TransientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransientError::FileSave => f.write_str("file save failed"),
        }
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalError::SchedulerCorrupt => f.write_str("scheduler table corrupted"),
            FatalError::BadCmdevState => f.write_str("CMDEV has no transition for this event"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<NotFoundError> for Error {
    fn from(e: NotFoundError) -> Self {
        Error::NotFound(e)
    }
}

impl From<FullError> for Error {
    fn from(e: FullError) -> Self {
        Error::Full(e)
    }
}

impl From<TransientError> for Error {
    fn from(e: TransientError) -> Self {
        Error::Transient(e)
    }
}

impl From<FatalError> for Error {
    fn from(e: FatalError) -> Self {
        Error::Fatal(e)
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
