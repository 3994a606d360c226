//! evdev key source
//!
//! Finds the button's input device by scanning `/dev/input/event*` and
//! matching the kernel-reported device name against a list of substrings,
//! then reports press/release edges for one key code.

use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::mem::size_of;
use std::os::fd::{AsFd, AsRawFd};
use std::path::{Path, PathBuf};

use log::{debug, info};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use roundel_hal::{KeyEdge, KeyEventSource};

use crate::error::{HalError, Result};

/// `EV_KEY` event type
pub const EV_KEY: u16 = 0x01;
/// `KEY_POWER` key code
pub const KEY_POWER: u16 = 116;

/// Number of `/dev/input/eventN` nodes probed
const MAX_EVENT_NODES: u32 = 32;

nix::ioctl_read_buf!(eviocgname, b'E', 0x06, u8);

/// Size of one `struct input_event` on this target
const EVENT_SIZE: usize = size_of::<libc::input_event>();
/// Offset of the `type` field (after `struct timeval`)
const TYPE_OFFSET: usize = size_of::<libc::timeval>();

/// A decoded `struct input_event` (timestamp dropped)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawInputEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

/// Decode as many whole `input_event` records as `buf` holds
pub fn parse_events(buf: &[u8]) -> impl Iterator<Item = RawInputEvent> + '_ {
    buf.chunks_exact(EVENT_SIZE).map(|rec| {
        let t = TYPE_OFFSET;
        RawInputEvent {
            kind: u16::from_ne_bytes([rec[t], rec[t + 1]]),
            code: u16::from_ne_bytes([rec[t + 2], rec[t + 3]]),
            value: i32::from_ne_bytes([rec[t + 4], rec[t + 5], rec[t + 6], rec[t + 7]]),
        }
    })
}

/// Map a raw event to an edge of `key_code`; autorepeat (value 2) is dropped
pub fn key_edge(ev: &RawInputEvent, key_code: u16) -> Option<KeyEdge> {
    if ev.kind != EV_KEY || ev.code != key_code {
        return None;
    }
    match ev.value {
        1 => Some(KeyEdge::Pressed),
        0 => Some(KeyEdge::Released),
        _ => None,
    }
}

/// Key edges from one evdev node
pub struct EvdevKeySource {
    file: File,
    path: PathBuf,
    key_code: u16,
    pending: VecDeque<KeyEdge>,
}

impl EvdevKeySource {
    /// Open a specific event node
    pub fn open(path: impl AsRef<Path>, key_code: u16) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| HalError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            key_code,
            pending: VecDeque::new(),
        })
    }

    /// Scan `/dev/input` for the first device whose name contains one of
    /// `patterns`
    pub fn find(patterns: &[String], key_code: u16) -> Result<Self> {
        Self::find_in(Path::new("/dev/input"), patterns, key_code)
    }

    pub fn find_in(dir: &Path, patterns: &[String], key_code: u16) -> Result<Self> {
        for n in 0..MAX_EVENT_NODES {
            let path = dir.join(format!("event{}", n));
            let Ok(file) = File::open(&path) else {
                continue;
            };
            let Some(name) = device_name(&file) else {
                continue;
            };
            debug!("{}: {}", path.display(), name);
            if patterns.iter().any(|p| name.contains(p.as_str())) {
                info!("button device {} ({})", path.display(), name);
                return Ok(Self {
                    file,
                    path,
                    key_code,
                    pending: VecDeque::new(),
                });
            }
        }
        Err(HalError::NoInputDevice(patterns.to_vec()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_available(&mut self) -> Result<()> {
        let mut buf = [0u8; EVENT_SIZE * 16];
        let n = self.file.read(&mut buf)?;
        let key_code = self.key_code;
        self.pending
            .extend(parse_events(&buf[..n]).filter_map(|ev| key_edge(&ev, key_code)));
        Ok(())
    }
}

/// Kernel-reported device name, via `EVIOCGNAME`
fn device_name(file: &File) -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY: the ioctl writes at most buf.len() bytes into buf.
    let len = unsafe { eviocgname(file.as_raw_fd(), &mut buf) }.ok()?;
    let len = (len.max(0) as usize).min(buf.len());
    let name = &buf[..len];
    let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
    Some(String::from_utf8_lossy(&name[..end]).into_owned())
}

impl KeyEventSource for EvdevKeySource {
    type Error = HalError;

    fn wait_edge(&mut self, timeout_ms: u16) -> Result<Option<KeyEdge>> {
        if let Some(edge) = self.pending.pop_front() {
            return Ok(Some(edge));
        }

        let ready = {
            let mut fds = [PollFd::new(self.file.as_fd(), PollFlags::POLLIN)];
            poll(&mut fds, PollTimeout::from(timeout_ms))?
        };
        if ready > 0 {
            self.read_available()?;
        }
        Ok(self.pending.pop_front())
    }
}
