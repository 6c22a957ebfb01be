/*
 * File Descriptor Table
 *
 * Per-process file descriptor table for managing open devices.
 * Each entry maps an integer FD to an open file: the device it was
 * opened on plus the session (cursor) created by that open.
 *
 * FDs 0, 1, 2 are left to stdin/stdout/stderr; opened device files
 * are allocated from 3 upwards.
 */

use super::device::{Device, Errno, Session};
use alloc::collections::BTreeMap;
use alloc::sync::Arc;

/// An open device file
///
/// Several open files may point at the same device; each keeps its own
/// session, so cursors are independent.
pub struct OpenFile {
    pub device: Arc<dyn Device>,
    pub session: Session,
}

impl OpenFile {
    pub fn new(device: Arc<dyn Device>, session: Session) -> Self {
        Self { device, session }
    }
}

/// Per-process file descriptor table
pub struct FileDescriptorTable {
    fds: BTreeMap<i32, OpenFile>,
    next_fd: i32,
}

impl FileDescriptorTable {
    /// Create a new empty file descriptor table
    pub fn new() -> Self {
        Self {
            fds: BTreeMap::new(),
            next_fd: 3, // 0, 1, 2 reserved for stdin/stdout/stderr
        }
    }

    /// Get open file by file descriptor, or EBADF if FD is invalid
    pub fn get_mut(&mut self, fd: i32) -> Result<&mut OpenFile, Errno> {
        self.fds.get_mut(&fd).ok_or(Errno::EBADF)
    }

    /// Allocate new file descriptor (auto-assign)
    ///
    /// Assigns the next FD (>= 3) and inserts the open file.
    pub fn alloc(&mut self, file: OpenFile) -> i32 {
        let fd = self.next_fd;
        self.next_fd += 1;
        self.fds.insert(fd, file);
        fd
    }

    /// Close a file descriptor
    ///
    /// Removes the FD and hands the open file back so the caller can
    /// release the session on its device. Returns EBADF if FD doesn't exist.
    pub fn close(&mut self, fd: i32) -> Result<OpenFile, Errno> {
        self.fds.remove(&fd).ok_or(Errno::EBADF)
    }

    /// Get number of open file descriptors
    pub fn count(&self) -> usize {
        self.fds.len()
    }

    /// Check if a file descriptor is valid
    pub fn is_valid(&self, fd: i32) -> bool {
        self.fds.contains_key(&fd)
    }
}

impl Default for FileDescriptorTable {
    fn default() -> Self {
        Self::new()
    }
}
