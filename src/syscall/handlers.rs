/*
 * System Call Handlers
 *
 * Each handler:
 * - Validates arguments from userspace (pointers, file descriptors)
 * - Performs the requested operation on the open file
 * - Returns result or error code (negative for errors)
 *
 * Security considerations:
 * - All userspace pointers are checked with the host's UserAccess policy
 *   before a slice is built over them; zero-length transfers touch no
 *   user memory and skip the check
 * - File descriptors must be checked for validity
 * - The fd table lock is always taken before any device lock
 */

use core::mem::size_of;

use super::Host;
use crate::io::{Access, Errno, OpenFile, Stat, Whence};

impl Host {
    /// Validate a user pointer for `count` bytes
    fn validate_user_ptr(&self, ptr: usize, count: usize, access: Access) -> Result<(), Errno> {
        if self.user_access().access_ok(ptr, count, access) {
            Ok(())
        } else {
            Err(Errno::EFAULT)
        }
    }

    /// Run `op` on the open file behind `fd`
    fn with_file<T>(
        &self,
        fd: i32,
        op: impl FnOnce(&mut OpenFile) -> Result<T, Errno>,
    ) -> Result<T, Errno> {
        let mut fds = self.fds.lock();
        let file = fds.get_mut(fd)?;
        op(file)
    }

    pub fn sys_open(&self, major: u32) -> isize {
        let device = match self.chrdevs.lock().lookup(major) {
            Ok(device) => device,
            Err(err) => return err.as_ret(),
        };
        match device.open() {
            Ok(session) => self.fds.lock().alloc(OpenFile::new(device, session)) as isize,
            Err(err) => err.as_ret(),
        }
    }

    /// # Safety
    /// If the host's UserAccess policy accepts `[buf, buf + count)`, that
    /// region must be valid for writes and not aliased for the call.
    pub unsafe fn sys_read(&self, fd: i32, buf: *mut u8, count: usize) -> isize {
        if count == 0 {
            return ret_count(self.with_file(fd, |file| file.device.read(&mut file.session, &mut [])));
        }
        let result = self.validate_user_ptr(buf as usize, count, Access::Write).and_then(|()| {
            // Safety: region validated above, validity guaranteed by the caller
            let buf = unsafe { core::slice::from_raw_parts_mut(buf, count) };
            self.with_file(fd, |file| file.device.read(&mut file.session, buf))
        });
        ret_count(result)
    }

    /// # Safety
    /// If the host's UserAccess policy accepts `[buf, buf + count)`, that
    /// region must be valid for reads for the call.
    pub unsafe fn sys_write(&self, fd: i32, buf: *const u8, count: usize) -> isize {
        if count == 0 {
            return ret_count(self.with_file(fd, |file| file.device.write(&mut file.session, &[])));
        }
        let result = self.validate_user_ptr(buf as usize, count, Access::Read).and_then(|()| {
            // Safety: region validated above, validity guaranteed by the caller
            let buf = unsafe { core::slice::from_raw_parts(buf, count) };
            self.with_file(fd, |file| file.device.write(&mut file.session, buf))
        });
        ret_count(result)
    }

    pub fn sys_lseek(&self, fd: i32, offset: i64, whence: i32) -> isize {
        let whence = Whence::from_raw(whence);
        match self.with_file(fd, |file| file.device.seek(&mut file.session, offset, whence)) {
            Ok(pos) => pos as isize,
            Err(err) => err.as_ret(),
        }
    }

    /// The device validates `arg` itself, according to the command's
    /// direction and size.
    pub fn sys_ioctl(&self, fd: i32, request: u32, arg: usize) -> isize {
        match self.with_file(fd, |file| file.device.ioctl(&mut file.session, request, arg)) {
            Ok(ret) => ret as isize,
            Err(err) => err.as_ret(),
        }
    }

    pub fn sys_close(&self, fd: i32) -> isize {
        let file = match self.fds.lock().close(fd) {
            Ok(file) => file,
            Err(err) => return err.as_ret(),
        };
        file.device.release(file.session);
        0
    }

    /// # Safety
    /// If the host's UserAccess policy accepts the `Stat`-sized region at
    /// `statbuf`, it must be valid for writes for the call.
    pub unsafe fn sys_fstat(&self, fd: i32, statbuf: *mut Stat) -> isize {
        let result = self
            .validate_user_ptr(statbuf as usize, size_of::<Stat>(), Access::Write)
            .and_then(|()| self.with_file(fd, |file| Ok(file.device.stat())));
        match result {
            Ok(stat) => {
                // Safety: region validated above, validity guaranteed by the caller
                unsafe { core::ptr::write_unaligned(statbuf, stat) };
                0
            }
            Err(err) => err.as_ret(),
        }
    }
}

fn ret_count(result: Result<usize, Errno>) -> isize {
    match result {
        Ok(n) => n as isize,
        Err(err) => err.as_ret(),
    }
}
