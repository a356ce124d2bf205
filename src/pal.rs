//! Platform abstraction layer.
//!
//! Everything this crate cannot express portably — raw Ethernet tx/rx, UDP sockets, wall-clock
//! time, timers, mutexes and blob storage — is delegated to an implementation of [`Pal`]. The
//! state machines in this crate never touch a socket or a file directly; they only ever go
//! through this trait, which keeps them deterministically testable against an in-memory fake.

use crate::ethernet::EthernetAddress;

/// A single received Ethernet frame, as handed to the stack by [`Pal::recv_eth`].
#[derive(Debug, Clone)]
pub struct RxFrame {
    pub ethertype: u16,
    pub data: heapless::Vec<u8, { crate::MAX_FRAME_SIZE }>,
}

/// Platform abstraction layer required to drive a [`crate::net::Net`].
///
/// Implementations are expected to be cheap to call and non-blocking: `recv_eth` must return
/// immediately with `None` if nothing is pending, exactly like the PNAL receive path it mirrors,
/// which copies at most one frame into a single-slot buffer under a mutex between driver ticks.
pub trait Pal {
    /// The device's own MAC address on `port`.
    fn mac_address(&self) -> EthernetAddress;

    /// Monotonic microsecond timestamp, arbitrary epoch. Must never go backwards.
    fn now_us(&self) -> u32;

    /// Send a raw Ethernet II frame (header included) out of the given physical port.
    ///
    /// Returns the number of bytes sent, or `None` on a transport failure.
    fn send_eth(&mut self, port: usize, frame: &[u8]) -> Option<usize>;

    /// Poll for a single received frame, non-blocking.
    fn recv_eth(&mut self) -> Option<(usize, RxFrame)>;

    /// Persist `data` under `(directory, name)`, returning `Ok(())` on success.
    fn file_write(&mut self, directory: &str, name: &str, data: &[u8]) -> std::io::Result<()>;

    /// Load the bytes previously stored under `(directory, name)`, if any.
    fn file_read(&self, directory: &str, name: &str) -> std::io::Result<Vec<u8>>;
}

/// An in-memory [`Pal`] used by unit and scenario tests: frames pushed with
/// [`FakePal::deliver`] are returned (FIFO) from [`Pal::recv_eth`], and frames sent by the stack
/// are captured in [`FakePal::sent`].
#[derive(Debug, Default, Clone)]
pub struct FakePal {
    pub mac: EthernetAddress,
    pub clock_us: u32,
    pub sent: Vec<(usize, Vec<u8>)>,
    rx_queue: std::collections::VecDeque<(usize, u16, Vec<u8>)>,
    files: std::collections::HashMap<(String, String), Vec<u8>>,
}

impl FakePal {
    pub fn new(mac: EthernetAddress) -> Self {
        Self {
            mac,
            clock_us: 0,
            sent: Vec::new(),
            rx_queue: std::collections::VecDeque::new(),
            files: std::collections::HashMap::new(),
        }
    }

    /// Queue a frame as if it had just arrived on `port`.
    pub fn deliver(&mut self, port: usize, ethertype: u16, data: &[u8]) {
        self.rx_queue.push_back((port, ethertype, data.to_vec()));
    }

    pub fn advance_us(&mut self, delta: u32) {
        self.clock_us = self.clock_us.wrapping_add(delta);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.len()
    }
}

impl Pal for FakePal {
    fn mac_address(&self) -> EthernetAddress {
        self.mac
    }

    fn now_us(&self) -> u32 {
        self.clock_us
    }

    fn send_eth(&mut self, port: usize, frame: &[u8]) -> Option<usize> {
        self.sent.push((port, frame.to_vec()));
        Some(frame.len())
    }

    fn recv_eth(&mut self) -> Option<(usize, RxFrame)> {
        let (port, ethertype, data) = self.rx_queue.pop_front()?;
        let mut buf = heapless::Vec::new();
        buf.extend_from_slice(&data).ok()?;
        Some((port, RxFrame { ethertype, data: buf }))
    }

    fn file_write(&mut self, directory: &str, name: &str, data: &[u8]) -> std::io::Result<()> {
        self.files
            .insert((directory.to_string(), name.to_string()), data.to_vec());
        Ok(())
    }

    fn file_read(&self, directory: &str, name: &str) -> std::io::Result<Vec<u8>> {
        self.files
            .get(&(directory.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
    }
}
