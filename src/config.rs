/*
 * Device Configuration
 *
 * Compile-time defaults of the 4mb device and the knobs a host may
 * override when it loads the module (mostly tests shrinking capacity).
 *
 * Defaults:
 * - name "4mb", major 61
 * - capacity 4,000,000 bytes
 * - ioctl family 'k', command numbers 0..=14
 */

use crate::devices::DeviceError;
use crate::io::ioctl::{FOURMB_IOC_MAGIC, FOURMB_IOC_MAXNR};

/// Default major number
pub const MAJOR_NUMBER: u32 = 61;
/// Default device name
pub const DEVICE_NAME: &str = "4mb";
/// Default storage capacity in bytes
pub const MAX_BYTES: usize = 4_000_000;
/// Longest name the chrdev registry accepts
pub const NAME_MAX: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub name: &'static str,
    pub major: u32,
    pub capacity: usize,
    pub ioc_magic: u8,
    pub ioc_maxnr: u8,
}

impl DeviceConfig {
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Major 0 asks the registry for a dynamic major
    pub fn with_major(mut self, major: u32) -> Self {
        self.major = major;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_ioctl(mut self, magic: u8, maxnr: u8) -> Self {
        self.ioc_magic = magic;
        self.ioc_maxnr = maxnr;
        self
    }

    pub fn validate(&self) -> Result<(), DeviceError> {
        if self.capacity == 0 || self.capacity > isize::MAX as usize {
            return Err(DeviceError::InvalidArgument);
        }
        if self.name.is_empty() || self.name.len() > NAME_MAX {
            return Err(DeviceError::InvalidArgument);
        }
        Ok(())
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: DEVICE_NAME,
            major: MAJOR_NUMBER,
            capacity: MAX_BYTES,
            ioc_magic: FOURMB_IOC_MAGIC,
            ioc_maxnr: FOURMB_IOC_MAXNR,
        }
    }
}
