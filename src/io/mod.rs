/*
 * Input/Output System
 *
 * Device abstraction layer shared by every character device and the
 * syscall layer: the file-operations trait, errno/stat, the per-process
 * file descriptor table, ioctl number encoding and user memory checks.
 */

pub mod device;
pub mod fd;
pub mod ioctl;
pub mod user;

// Re-export device abstraction types
pub use device::{Device, Errno, Session, Stat, Whence, S_IFCHR, S_IFMT};
pub use fd::{FileDescriptorTable, OpenFile};
pub use user::{Access, UserAccess, UserSpace};
