/*
 * Character Device Registry
 *
 * Binds a major number and a short name to a device's file operations.
 * The syscall layer resolves `open(major)` through this table.
 *
 * Major numbers:
 * - A fixed major (1..=511) is taken as given, EBUSY if already bound
 * - Major 0 asks for a dynamic one, searched from 254 down to 234
 *   (the range Linux leaves for local/experimental drivers)
 */

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use heapless::String;

use crate::config::NAME_MAX;
use crate::io::{Device, Errno};

/// Highest major number accepted
pub const CHRDEV_MAJOR_MAX: u32 = 511;
/// Dynamic majors are handed out from here downwards
pub const CHRDEV_MAJOR_DYN_START: u32 = 254;
/// Lowest dynamic major
pub const CHRDEV_MAJOR_DYN_END: u32 = 234;

struct ChrdevEntry {
    name: String<NAME_MAX>,
    device: Arc<dyn Device>,
}

/// Major number -> device table
pub struct ChrdevRegistry {
    entries: BTreeMap<u32, ChrdevEntry>,
}

impl ChrdevRegistry {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register a device under `major` (0 = allocate one)
    ///
    /// Returns the major the device is bound to.
    pub fn register(&mut self, major: u32, name: &str, device: Arc<dyn Device>) -> Result<u32, Errno> {
        if major > CHRDEV_MAJOR_MAX {
            return Err(Errno::EINVAL);
        }
        let mut entry_name: String<NAME_MAX> = String::new();
        if name.is_empty() || entry_name.push_str(name).is_err() {
            return Err(Errno::EINVAL);
        }

        let major = if major == 0 {
            self.find_dynamic_major()?
        } else if self.entries.contains_key(&major) {
            log::warn!("chrdev: major {} already registered", major);
            return Err(Errno::EBUSY);
        } else {
            major
        };

        self.entries.insert(major, ChrdevEntry { name: entry_name, device });
        log::info!("chrdev: registered '{}' at major {}", name, major);
        Ok(major)
    }

    /// Remove the binding; the name must match the one registered
    pub fn unregister(&mut self, major: u32, name: &str) -> Result<(), Errno> {
        match self.entries.get(&major) {
            Some(entry) if entry.name.as_str() == name => {
                self.entries.remove(&major);
                log::info!("chrdev: unregistered '{}' at major {}", name, major);
                Ok(())
            }
            _ => Err(Errno::EINVAL),
        }
    }

    /// Device bound to `major`, or ENODEV
    pub fn lookup(&self, major: u32) -> Result<Arc<dyn Device>, Errno> {
        self.entries
            .get(&major)
            .map(|entry| entry.device.clone())
            .ok_or(Errno::ENODEV)
    }

    pub fn name(&self, major: u32) -> Option<&str> {
        self.entries.get(&major).map(|entry| entry.name.as_str())
    }

    pub fn is_registered(&self, major: u32) -> bool {
        self.entries.contains_key(&major)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    fn find_dynamic_major(&self) -> Result<u32, Errno> {
        (CHRDEV_MAJOR_DYN_END..=CHRDEV_MAJOR_DYN_START)
            .rev()
            .find(|major| !self.entries.contains_key(major))
            .ok_or(Errno::EBUSY)
    }
}

impl Default for ChrdevRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use crate::devices::{ByteDevice, GlobalArena};

    fn dev() -> Arc<dyn Device> {
        let config = DeviceConfig::default().with_capacity(16);
        Arc::new(ByteDevice::new(config, Arc::new(GlobalArena)).unwrap())
    }

    #[test]
    fn fixed_major_is_exclusive() {
        let mut reg = ChrdevRegistry::new();
        assert_eq!(reg.register(61, "4mb", dev()), Ok(61));
        assert!(matches!(reg.register(61, "other", dev()), Err(Errno::EBUSY)));
        assert_eq!(reg.name(61), Some("4mb"));
        assert!(reg.lookup(61).is_ok());
        assert!(matches!(reg.lookup(62), Err(Errno::ENODEV)));
    }

    #[test]
    fn dynamic_majors_count_down() {
        let mut reg = ChrdevRegistry::new();
        assert_eq!(reg.register(0, "a", dev()), Ok(254));
        assert_eq!(reg.register(0, "b", dev()), Ok(253));
        reg.unregister(254, "a").unwrap();
        assert_eq!(reg.register(0, "c", dev()), Ok(254));
    }

    #[test]
    fn dynamic_range_exhaustion() {
        let mut reg = ChrdevRegistry::new();
        for _ in CHRDEV_MAJOR_DYN_END..=CHRDEV_MAJOR_DYN_START {
            reg.register(0, "dyn", dev()).unwrap();
        }
        assert!(matches!(reg.register(0, "dyn", dev()), Err(Errno::EBUSY)));
    }

    #[test]
    fn rejects_bad_names_and_majors() {
        let mut reg = ChrdevRegistry::new();
        assert!(matches!(reg.register(61, "", dev()), Err(Errno::EINVAL)));
        let long = "x".repeat(NAME_MAX + 1);
        assert!(matches!(reg.register(61, &long, dev()), Err(Errno::EINVAL)));
        assert!(matches!(reg.register(CHRDEV_MAJOR_MAX + 1, "big", dev()), Err(Errno::EINVAL)));
        assert_eq!(reg.count(), 0);
    }

    #[test]
    fn unregister_requires_matching_name() {
        let mut reg = ChrdevRegistry::new();
        reg.register(61, "4mb", dev()).unwrap();
        assert_eq!(reg.unregister(61, "8mb"), Err(Errno::EINVAL));
        assert!(reg.is_registered(61));
        assert_eq!(reg.unregister(61, "4mb"), Ok(()));
        assert_eq!(reg.unregister(61, "4mb"), Err(Errno::EINVAL));
    }
}
