//! Input device discovery and event reading.
//!
//! Keyboards are Linux event devices. Discovery walks
//! `/proc/bus/input/devices`, picks the first entry whose handlers and event
//! bits match the requested kind (and whose name matches the selector, if
//! any), and opens its `/dev/input/eventN` node non-blocking.
//!
//! Reads never wait: an empty queue surfaces as `ErrorKind::WouldBlock`.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Kernel input device inventory.
pub const PROC_INPUT_DEVICES: &str = "/proc/bus/input/devices";

/// Directory holding event device nodes.
pub const DEV_INPUT_DIR: &str = "/dev/input";

/// `EV_KEY` event type.
const EV_KEY: u16 = 0x01;

/// `EV_REP` event type (autorepeat, set for real keyboards only).
const EV_REP: u16 = 0x14;

/// Events fetched per read call.
const EVENT_BATCH: usize = 64;

nix::ioctl_write_int!(
    /// `EVIOCGRAB`: take or release exclusive access to an event device.
    eviocgrab,
    b'E',
    0x90
);

// ─── Events ─────────────────────────────────────────────────────────

/// Input event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// `EV_SYN` separator
    Sync,
    /// `EV_KEY` key press, repeat or release
    Key,
    /// `EV_MSC` miscellaneous report
    Misc,
    /// Any other event type
    Other(u16),
}

impl EventKind {
    /// Map a raw `input_event.type` value.
    pub fn from_raw(kind: u16) -> Self {
        match kind {
            0x00 => EventKind::Sync,
            EV_KEY => EventKind::Key,
            0x04 => EventKind::Misc,
            other => EventKind::Other(other),
        }
    }
}

/// A single hardware event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanEvent {
    /// Event type
    pub kind: EventKind,
    /// Scan code (key events) or report code
    pub code: u16,
    /// Non-zero for key-down and repeat, zero for key-up
    pub value: i32,
}

impl ScanEvent {
    /// Key event with an explicit value.
    pub fn key(code: u16, value: i32) -> Self {
        Self {
            kind: EventKind::Key,
            code,
            value,
        }
    }

    /// Key-down event.
    pub fn key_down(code: u16) -> Self {
        Self::key(code, 1)
    }

    /// Key-up event.
    pub fn key_up(code: u16) -> Self {
        Self::key(code, 0)
    }

    /// `SYN_REPORT` separator emitted after every batch.
    pub fn sync() -> Self {
        Self {
            kind: EventKind::Sync,
            code: 0,
            value: 0,
        }
    }

    /// `MSC_SCAN` report carrying the raw hardware scan code.
    pub fn misc_scan(value: i32) -> Self {
        Self {
            kind: EventKind::Misc,
            code: 4,
            value,
        }
    }

    /// Key-down or repeat.
    pub fn is_down(&self) -> bool {
        self.value != 0
    }
}

/// Source of queued hardware events.
pub trait InputDevice: Send {
    /// Device name as reported by the kernel.
    fn name(&self) -> &str;

    /// Read currently queued events without blocking.
    ///
    /// # Errors
    /// `ErrorKind::WouldBlock` when nothing is queued; other errors mean the
    /// device failed.
    fn read_events(&mut self) -> io::Result<Vec<ScanEvent>>;

    /// Take exclusive access so events stop reaching other readers.
    ///
    /// Released when the device is dropped.
    fn grab(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Discovery ──────────────────────────────────────────────────────

/// Device category to discover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Keyboard (`kbd` handler with key and autorepeat events)
    Keyboard,
}

/// One entry of the kernel input device inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device name (`N:` line)
    pub name: String,
    /// Attached handlers (`H:` line)
    pub handlers: Vec<String>,
    /// Supported event type bitmask (`B: EV=`)
    pub ev_bits: u64,
}

impl DeviceInfo {
    /// Whether the device belongs to `kind`.
    pub fn is_kind(&self, kind: DeviceKind) -> bool {
        match kind {
            DeviceKind::Keyboard => {
                let bits = (1 << EV_KEY) | (1 << EV_REP);
                self.handlers.iter().any(|h| h == "kbd") && self.ev_bits & bits == bits
            }
        }
    }

    /// `/dev/input/eventN` node of the device.
    pub fn event_node(&self) -> Option<PathBuf> {
        self.handlers
            .iter()
            .find(|h| h.starts_with("event"))
            .map(|h| Path::new(DEV_INPUT_DIR).join(h))
    }
}

/// Parse the contents of `/proc/bus/input/devices`.
pub fn parse_device_list(content: &str) -> Vec<DeviceInfo> {
    let mut devices = Vec::new();
    let mut current: Option<DeviceInfo> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            devices.extend(current.take());
            continue;
        }

        let info = current.get_or_insert_with(DeviceInfo::default);
        if let Some(name) = line.strip_prefix("N: Name=") {
            info.name = name.trim_matches('"').to_string();
        } else if let Some(handlers) = line.strip_prefix("H: Handlers=") {
            info.handlers = handlers.split_whitespace().map(str::to_string).collect();
        } else if let Some(bits) = line.strip_prefix("B: EV=") {
            info.ev_bits = u64::from_str_radix(bits.trim(), 16).unwrap_or(0);
        }
    }
    devices.extend(current);
    devices
}

/// Find and open the first device of `kind`, optionally matching `exact` by name.
///
/// Returns `None` if no matching device exists or none could be opened.
pub fn find_device(kind: DeviceKind, exact: Option<&str>) -> Option<EvdevDevice> {
    let content = match std::fs::read_to_string(PROC_INPUT_DEVICES) {
        Ok(content) => content,
        Err(e) => {
            warn!("Cannot read {}: {}", PROC_INPUT_DEVICES, e);
            return None;
        }
    };

    for info in parse_device_list(&content) {
        if !info.is_kind(kind) || exact.is_some_and(|name| name != info.name) {
            continue;
        }
        let Some(node) = info.event_node() else {
            continue;
        };
        match EvdevDevice::open(&node, &info.name) {
            Ok(device) => {
                info!("Found {:?} device '{}' at {:?}", kind, info.name, node);
                return Some(device);
            }
            Err(e) => debug!("Cannot open {:?} ({}): {}", node, info.name, e),
        }
    }

    debug!("No {:?} device found (exact={:?})", kind, exact);
    None
}

// ─── Event device ───────────────────────────────────────────────────

/// Open Linux event device.
///
/// The file handle and any exclusive grab are released on drop.
pub struct EvdevDevice {
    file: File,
    name: String,
    path: PathBuf,
    grabbed: bool,
}

impl EvdevDevice {
    /// Open an event node in non-blocking mode.
    pub fn open(path: &Path, name: &str) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)?;
        Ok(Self {
            file,
            name: name.to_string(),
            path: path.to_path_buf(),
            grabbed: false,
        })
    }

    /// Device node path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InputDevice for EvdevDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn grab(&mut self) -> io::Result<()> {
        // SAFETY: the descriptor is owned by `self.file` and valid for the call.
        unsafe { eviocgrab(self.file.as_raw_fd(), 1) }.map_err(io::Error::from)?;
        self.grabbed = true;
        Ok(())
    }

    fn read_events(&mut self) -> io::Result<Vec<ScanEvent>> {
        let event_size = std::mem::size_of::<libc::input_event>();
        let mut buf = vec![0u8; event_size * EVENT_BATCH];
        let read = self.file.read(&mut buf)?;

        let events = buf[..read]
            .chunks_exact(event_size)
            .map(|chunk| {
                // SAFETY: the chunk holds exactly one kernel `input_event`;
                // `read_unaligned` tolerates the byte buffer's alignment.
                let raw: libc::input_event =
                    unsafe { std::ptr::read_unaligned(chunk.as_ptr().cast()) };
                ScanEvent {
                    kind: EventKind::from_raw(raw.type_),
                    code: raw.code,
                    value: raw.value,
                }
            })
            .collect();
        Ok(events)
    }
}

impl Drop for EvdevDevice {
    fn drop(&mut self) {
        if self.grabbed {
            // SAFETY: the descriptor is still open; it closes after this body.
            if let Err(e) = unsafe { eviocgrab(self.file.as_raw_fd(), 0) } {
                warn!("Failed to release grab on {:?}: {}", self.path, e);
            }
        }
        debug!("Closed input device '{}' ({:?})", self.name, self.path);
    }
}

// ─── In-memory device ───────────────────────────────────────────────

/// Shared handle for feeding events into a `QueuedInputDevice`.
#[derive(Debug, Clone, Default)]
pub struct EventQueue(Arc<Mutex<VecDeque<ScanEvent>>>);

impl EventQueue {
    /// Queue one event.
    pub fn push(&self, event: ScanEvent) {
        self.extend([event]);
    }

    /// Queue several events in order.
    pub fn extend(&self, events: impl IntoIterator<Item = ScanEvent>) {
        match self.0.lock() {
            Ok(mut queue) => queue.extend(events),
            Err(poisoned) => poisoned.into_inner().extend(events),
        }
    }

    /// Number of events not yet read.
    pub fn len(&self) -> usize {
        self.0.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Returns `true` if every queued event has been read.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Input device backed by an in-memory queue, for simulation and tests.
pub struct QueuedInputDevice {
    name: String,
    queue: EventQueue,
}

impl QueuedInputDevice {
    /// Create a device with an empty queue.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            queue: EventQueue::default(),
        }
    }

    /// Handle for pushing events after the device has been handed off.
    pub fn queue(&self) -> EventQueue {
        self.queue.clone()
    }
}

impl InputDevice for QueuedInputDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_events(&mut self) -> io::Result<Vec<ScanEvent>> {
        let mut queue = self
            .queue
            .0
            .lock()
            .map_err(|_| io::Error::other("event queue poisoned"))?;
        if queue.is_empty() {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        Ok(queue.drain(..).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICES: &str = r#"I: Bus=0019 Vendor=0000 Product=0001 Version=0000
N: Name="Power Button"
P: Phys=LNXPWRBN/button/input0
H: Handlers=kbd event0
B: PROP=0
B: EV=3
B: KEY=10000000000000 0

I: Bus=0011 Vendor=0001 Product=0001 Version=ab41
N: Name="AT Translated Set 2 keyboard"
P: Phys=isa0060/serio0/input0
H: Handlers=sysrq kbd event3 leds
B: PROP=0
B: EV=120013
B: KEY=402000000 3803078f800d001 feffffdfffefffff fffffffffffffffe

I: Bus=0011 Vendor=0002 Product=0001 Version=0000
N: Name="PS/2 Generic Mouse"
H: Handlers=mouse0 event4
B: PROP=1
B: EV=7
"#;

    #[test]
    fn parse_inventory() {
        let devices = parse_device_list(DEVICES);
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[1].name, "AT Translated Set 2 keyboard");
        assert_eq!(devices[1].handlers, vec!["sysrq", "kbd", "event3", "leds"]);
        assert_eq!(devices[1].ev_bits, 0x120013);
        assert_eq!(
            devices[1].event_node(),
            Some(PathBuf::from("/dev/input/event3"))
        );
    }

    #[test]
    fn keyboard_kind_needs_kbd_handler_and_repeat() {
        let devices = parse_device_list(DEVICES);
        let keyboards: Vec<_> = devices
            .iter()
            .filter(|d| d.is_kind(DeviceKind::Keyboard))
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(keyboards, vec!["AT Translated Set 2 keyboard"]);
    }

    #[test]
    fn event_kind_from_raw() {
        assert_eq!(EventKind::from_raw(0), EventKind::Sync);
        assert_eq!(EventKind::from_raw(1), EventKind::Key);
        assert_eq!(EventKind::from_raw(4), EventKind::Misc);
        assert_eq!(EventKind::from_raw(0x11), EventKind::Other(0x11));
    }

    #[test]
    fn queued_device_would_block_when_empty() {
        let mut device = QueuedInputDevice::new("test");
        let err = device.read_events().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn queued_device_drains_everything() {
        let mut device = QueuedInputDevice::new("test");
        let queue = device.queue();
        queue.extend([ScanEvent::key_down(30), ScanEvent::sync()]);
        assert_eq!(queue.len(), 2);

        let events = device.read_events().unwrap();
        assert_eq!(events, vec![ScanEvent::key_down(30), ScanEvent::sync()]);
        assert!(queue.is_empty());
        assert!(device.read_events().is_err());
    }

    #[test]
    fn missing_node_fails_to_open() {
        let result = EvdevDevice::open(Path::new("/nonexistent/event99"), "ghost");
        assert!(result.is_err());
    }
}
