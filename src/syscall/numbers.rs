/*
 * System Call Numbers
 *
 * Linux x86_64 numbers for the file syscalls a character device needs.
 * Error returns are negative errno values (see `Errno::as_ret`).
 */

/// Read from file descriptor
///
/// Arguments: (fd: i32, buf: *mut u8, count: usize) -> isize
/// Returns: number of bytes read, or negative error code
pub const SYS_READ: usize = 0;

/// Write to file descriptor
///
/// Arguments: (fd: i32, buf: *const u8, count: usize) -> isize
/// Returns: number of bytes written, or negative error code
pub const SYS_WRITE: usize = 1;

/// Open a character device
///
/// Arguments: (major: u32) -> isize
/// Returns: new file descriptor, or negative error code
pub const SYS_OPEN: usize = 2;

/// Close file descriptor
///
/// Arguments: (fd: i32) -> isize
/// Returns: 0 on success, or negative error code
pub const SYS_CLOSE: usize = 3;

/// Get file status
///
/// Arguments: (fd: i32, statbuf: *mut Stat) -> isize
/// Returns: 0 on success, or negative error code
pub const SYS_FSTAT: usize = 5;

/// Seek to position in file
///
/// Arguments: (fd: i32, offset: i64, whence: i32) -> isize
/// Returns: new file position, or negative error code
pub const SYS_LSEEK: usize = 8;

/// Device control
///
/// Arguments: (fd: i32, request: u32, arg: usize) -> isize
/// Returns: handler result, or negative error code
pub const SYS_IOCTL: usize = 16;
