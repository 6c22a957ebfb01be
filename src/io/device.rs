/*
 * Device Abstraction Layer
 *
 * File-operations trait implemented by every character device the host
 * can bind to a major number, plus the POSIX subset (errno, stat, seek
 * whence) shared by devices and the syscall layer.
 *
 * Unlike a TTY, a storage device has a position. The position is not
 * device state: it lives in the `Session` handed out by `open` and is
 * owned by whoever holds the open file (normally the fd table), so two
 * opens of the same device never share a cursor.
 */

use core::fmt;

/// Per-open state of a device file
///
/// Created by `Device::open` with the cursor at 0 and dropped on close.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Session {
    cursor: usize,
}

impl Session {
    pub const fn new() -> Self {
        Self { cursor: 0 }
    }

    /// Current read/write offset
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }
}

/// Reference point for a seek
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// new = offset
    FromStart,
    /// new = cursor + offset
    FromCurrent,
    /// new = size - offset
    FromEnd,
}

impl Whence {
    /// Decode a raw `whence` argument
    ///
    /// Anything other than SEEK_SET or SEEK_CUR is treated as SEEK_END,
    /// so a seek never fails on its mode.
    pub fn from_raw(whence: i32) -> Self {
        match whence {
            SEEK_SET => Whence::FromStart,
            SEEK_CUR => Whence::FromCurrent,
            _ => Whence::FromEnd,
        }
    }
}

/// Device trait for character devices
///
/// Every method receives the caller's session so the device can read and
/// advance the cursor. Devices without a position keep the default `seek`.
pub trait Device: Send + Sync {
    /// Open a new session (cursor at 0)
    fn open(&self) -> Result<Session, Errno> {
        Ok(Session::new())
    }

    /// Release a session
    fn release(&self, _session: Session) {}

    /// Read up to buf.len() bytes into buf
    ///
    /// Returns the number of bytes read, or an error.
    /// A return of 0 means end of data.
    fn read(&self, session: &mut Session, buf: &mut [u8]) -> Result<usize, Errno>;

    /// Write up to buf.len() bytes from buf
    ///
    /// Returns the number of bytes written, which may be short.
    fn write(&self, session: &mut Session, buf: &[u8]) -> Result<usize, Errno>;

    /// Device control operation (ioctl)
    fn ioctl(&self, session: &mut Session, request: u32, arg: usize) -> Result<i32, Errno>;

    /// Get device metadata
    fn stat(&self) -> Stat;

    /// Seek to position (default: not seekable)
    fn seek(&self, _session: &mut Session, _offset: i64, _whence: Whence) -> Result<u64, Errno> {
        Err(Errno::ESPIPE)
    }
}

/// POSIX errno values
///
/// Subset of standard POSIX error codes for syscall compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Errno {
    EBADF = 9,   // Bad file descriptor
    ENOMEM = 12, // Out of memory
    EFAULT = 14, // Bad address
    EBUSY = 16,  // Device or resource busy
    ENODEV = 19, // No such device
    EINVAL = 22, // Invalid argument
    ENOTTY = 25, // Inappropriate ioctl for device
    ESPIPE = 29, // Illegal seek
    ENOSYS = 38, // Function not implemented
}

impl Errno {
    /// Negative value as returned by a syscall
    pub fn as_ret(self) -> isize {
        -(self as i32 as isize)
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, *self as i32)
    }
}

/// Minimal stat structure
///
/// Subset of POSIX struct stat.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub st_mode: u32,    // File type and mode
    pub st_size: u64,    // File size in bytes
    pub st_blksize: u64, // Block size for I/O
    pub st_blocks: u64,  // Number of 512B blocks allocated
}

// File type constants (POSIX)
pub const S_IFMT: u32 = 0o170000; // File type mask
pub const S_IFCHR: u32 = 0o020000; // Character device

// Seek whence constants (POSIX)
pub const SEEK_SET: i32 = 0; // Seek from beginning
pub const SEEK_CUR: i32 = 1; // Seek from current position
pub const SEEK_END: i32 = 2; // Seek from end

/// Check if mode indicates a character device
#[inline]
#[allow(non_snake_case)]
pub fn S_ISCHR(mode: u32) -> bool {
    (mode & S_IFMT) == S_IFCHR
}
