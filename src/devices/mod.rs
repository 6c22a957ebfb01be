/*
 * Device Drivers
 *
 * Character devices the host can register, their storage arenas and the
 * registry binding major numbers to them.
 */

pub mod arena;
pub mod chrdev;
pub mod fourmb;

use core::fmt;

use crate::io::Errno;

pub use arena::{DeviceBuffer, GlobalArena, HeapArena, StorageArena};
pub use chrdev::ChrdevRegistry;
pub use fourmb::ByteDevice;

/// Errors raised by device operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// Storage could not be allocated on attach
    OutOfMemory,
    /// ioctl outside the device's command family, range or handler table
    UnsupportedCommand,
    /// Argument region failed the access check (or a bad configuration)
    InvalidArgument,
    /// Operation on a device whose storage is not attached
    NotAttached,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DeviceError::OutOfMemory => "out of memory",
            DeviceError::UnsupportedCommand => "unsupported command",
            DeviceError::InvalidArgument => "invalid argument",
            DeviceError::NotAttached => "device not attached",
        };
        f.write_str(msg)
    }
}

impl From<DeviceError> for Errno {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::OutOfMemory => Errno::ENOMEM,
            DeviceError::UnsupportedCommand => Errno::ENOTTY,
            DeviceError::InvalidArgument => Errno::EFAULT,
            DeviceError::NotAttached => Errno::ENODEV,
        }
    }
}
