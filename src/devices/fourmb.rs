/*
 * 4mb Byte Device
 *
 * A fixed-capacity character device: one buffer of `capacity` bytes and
 * a logical size marking the end of valid data. Sessions carry their own
 * cursor; the buffer and logical size are shared by every session.
 *
 * Contract:
 * - read:  copies min(len, size - cursor) bytes, 0 at or past end of data
 * - write: copies min(len, capacity - cursor) bytes, then the logical
 *          size becomes the new cursor. A write that ends before the old
 *          end of data truncates everything after it.
 * - seek:  start / current / end-minus-offset, clamped to [0, size]
 * - ioctl: family and range gate, argument access check, then dispatch
 *
 * Short transfers are reported through the returned count, never as
 * errors. Seek never fails.
 *
 * Locking:
 * - One spin lock guards buffer + logical size, held for the whole of
 *   each read, write, seek, attach and detach
 * - Cursors are not behind the lock; a session is only ever touched
 *   through `&mut Session`
 */

use alloc::boxed::Box;
use alloc::sync::Arc;
use spin::Mutex;

use super::arena::{DeviceBuffer, StorageArena};
use super::DeviceError;
use crate::config::DeviceConfig;
use crate::io::device::{Device, Errno, Session, Stat, Whence, S_IFCHR};
use crate::io::ioctl::{self, Command, IocDir};
use crate::io::user::{Access, UserAccess, UserSpace};

/// Attached storage
struct Storage {
    buffer: DeviceBuffer,
    logical_size: usize,
}

/// Fixed-capacity byte device
pub struct ByteDevice {
    config: DeviceConfig,
    arena: Arc<dyn StorageArena>,
    user: Box<dyn UserAccess>,
    state: Mutex<Option<Storage>>,
}

impl ByteDevice {
    /// Create a detached device
    ///
    /// Storage is not allocated until `attach`.
    pub fn new(config: DeviceConfig, arena: Arc<dyn StorageArena>) -> Result<Self, DeviceError> {
        config.validate()?;
        Ok(Self {
            config,
            arena,
            user: Box::new(UserSpace::canonical()),
            state: Mutex::new(None),
        })
    }

    /// Replace the policy used to check ioctl argument regions
    pub fn with_user_access(mut self, user: impl UserAccess + 'static) -> Self {
        self.user = Box::new(user);
        self
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn is_attached(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Current end of valid data (0 while detached)
    pub fn logical_size(&self) -> usize {
        self.state.lock().as_ref().map_or(0, |s| s.logical_size)
    }

    /// Allocate storage and reset the logical size
    ///
    /// Attaching an attached device drops the old buffer first, so on
    /// failure the device is left detached with nothing allocated.
    pub fn attach(&self) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        *state = None;

        let buffer = self.arena.clone().allocate(self.config.capacity).map_err(|err| {
            log::error!("{}: cannot allocate {} bytes: {}", self.config.name, self.config.capacity, err);
            err
        })?;

        *state = Some(Storage { buffer, logical_size: 0 });
        log::info!("This is a {} byte device ({} bytes)", self.config.name, self.config.capacity);
        Ok(())
    }

    /// Release storage; no-op when already detached
    pub fn detach(&self) {
        if self.state.lock().take().is_some() {
            log::info!("{} byte device is detached", self.config.name);
        }
    }

    /// New session with the cursor at 0
    pub fn open(&self) -> Session {
        Session::new()
    }

    pub fn close(&self, _session: Session) {}

    /// Read from the session cursor, at most `buf.len()` bytes
    pub fn read(&self, session: &mut Session, buf: &mut [u8]) -> Result<usize, DeviceError> {
        let state = self.state.lock();
        let storage = state.as_ref().ok_or(DeviceError::NotAttached)?;

        let cursor = session.cursor();
        let n = buf.len().min(storage.logical_size.saturating_sub(cursor));
        if n == 0 {
            return Ok(0);
        }

        buf[..n].copy_from_slice(&storage.buffer.as_slice()[cursor..cursor + n]);
        session.set_cursor(cursor + n);

        log::debug!("{}: read {} bytes at offset {}", self.config.name, n, cursor);
        Ok(n)
    }

    /// Write at the session cursor, bounded by the remaining capacity
    ///
    /// The logical size is set to the cursor after the write, whether
    /// that grows or shrinks it.
    pub fn write(&self, session: &mut Session, data: &[u8]) -> Result<usize, DeviceError> {
        let mut state = self.state.lock();
        let storage = state.as_mut().ok_or(DeviceError::NotAttached)?;

        let cursor = session.cursor().min(self.config.capacity);
        let n = data.len().min(self.config.capacity - cursor);
        storage.buffer.as_mut_slice()[cursor..cursor + n].copy_from_slice(&data[..n]);

        let end = cursor + n;
        session.set_cursor(end);
        storage.logical_size = end;

        log::debug!("{}: bytes written: {}", self.config.name, n);
        Ok(n)
    }

    /// Move the session cursor
    ///
    /// `FromEnd` counts backwards: the target is `size - offset`. The
    /// result is clamped to `[0, size]` and returned.
    pub fn seek(&self, session: &mut Session, offset: i64, whence: Whence) -> usize {
        let state = self.state.lock();
        let size = state.as_ref().map_or(0, |s| s.logical_size) as i64;

        let target = match whence {
            Whence::FromStart => offset,
            Whence::FromCurrent => (session.cursor() as i64).saturating_add(offset),
            Whence::FromEnd => size.saturating_sub(offset),
        };
        let pos = target.clamp(0, size) as usize;

        session.set_cursor(pos);
        pos
    }

    /// Validate and dispatch a device command
    pub fn control(&self, _session: &mut Session, request: u32, arg: usize) -> Result<i32, DeviceError> {
        let cmd = ioctl::validate(request, self.config.ioc_magic, self.config.ioc_maxnr).map_err(|err| {
            log::warn!("{}: rejected ioctl 0x{:x}", self.config.name, request);
            err
        })?;

        let dir = cmd.dir();
        if dir.contains(IocDir::READ) && !self.user.access_ok(arg, cmd.size(), Access::Write) {
            return Err(DeviceError::InvalidArgument);
        }
        if dir.contains(IocDir::WRITE) && !self.user.access_ok(arg, cmd.size(), Access::Read) {
            return Err(DeviceError::InvalidArgument);
        }

        match Command::decode(cmd) {
            Some(Command::Hello) => {
                log::info!("{}: hello from ioctl", self.config.name);
                Ok(0)
            }
            None => {
                log::warn!("{}: no handler for ioctl nr {}", self.config.name, cmd.nr());
                Err(DeviceError::UnsupportedCommand)
            }
        }
    }
}

impl Device for ByteDevice {
    fn open(&self) -> Result<Session, Errno> {
        Ok(ByteDevice::open(self))
    }

    fn release(&self, session: Session) {
        self.close(session);
    }

    fn read(&self, session: &mut Session, buf: &mut [u8]) -> Result<usize, Errno> {
        Ok(ByteDevice::read(self, session, buf)?)
    }

    fn write(&self, session: &mut Session, buf: &[u8]) -> Result<usize, Errno> {
        Ok(ByteDevice::write(self, session, buf)?)
    }

    fn ioctl(&self, session: &mut Session, request: u32, arg: usize) -> Result<i32, Errno> {
        Ok(self.control(session, request, arg)?)
    }

    fn stat(&self) -> Stat {
        Stat {
            st_mode: S_IFCHR | 0o666, // Character device, rw-rw-rw-
            st_size: self.logical_size() as u64,
            st_blksize: 0,
            st_blocks: 0,
        }
    }

    fn seek(&self, session: &mut Session, offset: i64, whence: Whence) -> Result<u64, Errno> {
        Ok(ByteDevice::seek(self, session, offset, whence) as u64)
    }
}
