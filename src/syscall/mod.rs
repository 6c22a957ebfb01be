/*
 * System Call Interface
 *
 * The host side of the device: a `Host` owns the character device
 * registry and the file descriptor table of the calling process, and
 * turns integer syscalls into device operations.
 *
 * There is no process-wide state; every host (and every test) carries
 * its own registry and fd table.
 *
 * Syscall ABI:
 * - Number plus up to three arguments, all register-sized
 * - Return value is the result, or a negative errno
 */

pub mod handlers;
pub mod numbers;

use alloc::boxed::Box;
use alloc::sync::Arc;
use spin::Mutex;

use crate::devices::ChrdevRegistry;
use crate::io::{Device, Errno, FileDescriptorTable, Stat, UserAccess, UserSpace};
use numbers::*;

/// Kernel context the device is reached through
pub struct Host {
    chrdevs: Mutex<ChrdevRegistry>,
    fds: Mutex<FileDescriptorTable>,
    user: Box<dyn UserAccess>,
}

impl Host {
    pub fn new() -> Self {
        Self {
            chrdevs: Mutex::new(ChrdevRegistry::new()),
            fds: Mutex::new(FileDescriptorTable::new()),
            user: Box::new(UserSpace::canonical()),
        }
    }

    /// Replace the policy used to validate syscall buffers
    pub fn with_user_access(mut self, user: impl UserAccess + 'static) -> Self {
        self.user = Box::new(user);
        self
    }

    pub fn user_access(&self) -> &dyn UserAccess {
        self.user.as_ref()
    }

    /// Bind `device` to `major` (0 = dynamic); returns the major used
    pub fn register_chrdev(&self, major: u32, name: &str, device: Arc<dyn Device>) -> Result<u32, Errno> {
        self.chrdevs.lock().register(major, name, device)
    }

    pub fn unregister_chrdev(&self, major: u32, name: &str) -> Result<(), Errno> {
        self.chrdevs.lock().unregister(major, name)
    }

    pub fn is_registered(&self, major: u32) -> bool {
        self.chrdevs.lock().is_registered(major)
    }

    /// Number of open file descriptors
    pub fn open_files(&self) -> usize {
        self.fds.lock().count()
    }

    /// Syscall dispatcher
    ///
    /// # Safety
    /// Pointer arguments of SYS_READ, SYS_WRITE and SYS_FSTAT must satisfy
    /// the contracts of the corresponding handlers.
    pub unsafe fn dispatch(&self, syscall_num: usize, arg1: usize, arg2: usize, arg3: usize) -> isize {
        log::debug!(
            "Syscall {} called with args: {:#x}, {:#x}, {:#x}",
            syscall_num,
            arg1,
            arg2,
            arg3
        );

        // Safety: forwarded from the caller
        let ret = unsafe {
            match syscall_num {
                SYS_READ => self.sys_read(arg1 as i32, arg2 as *mut u8, arg3),
                SYS_WRITE => self.sys_write(arg1 as i32, arg2 as *const u8, arg3),
                SYS_OPEN => self.sys_open(arg1 as u32),
                SYS_CLOSE => self.sys_close(arg1 as i32),
                SYS_FSTAT => self.sys_fstat(arg1 as i32, arg2 as *mut Stat),
                SYS_LSEEK => self.sys_lseek(arg1 as i32, arg2 as i64, arg3 as i32),
                SYS_IOCTL => self.sys_ioctl(arg1 as i32, arg2 as u32, arg3),
                _ => {
                    log::warn!("Unknown syscall number: {}", syscall_num);
                    Errno::ENOSYS.as_ret()
                }
            }
        };

        log::debug!("Syscall {} returning: {}", syscall_num, ret);
        ret
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}
