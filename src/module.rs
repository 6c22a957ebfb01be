/*
 * 4mb Module Lifecycle
 *
 * Load: register the device under its major, then attach its storage.
 * If the storage cannot be allocated the registration is undone before
 * the error is returned, so a failed load leaves nothing behind.
 *
 * Unload: detach storage and drop the registration. Unloading twice is
 * a no-op. Files still open on the device keep their `Arc` but see
 * ENODEV from then on.
 */

use alloc::sync::Arc;

use crate::config::DeviceConfig;
use crate::devices::{ByteDevice, StorageArena};
use crate::io::Errno;
use crate::syscall::Host;

/// A loaded 4mb device
pub struct FourMbModule {
    device: Arc<ByteDevice>,
    major: u32,
    loaded: bool,
}

impl FourMbModule {
    pub fn init(host: &Host, config: DeviceConfig, arena: Arc<dyn StorageArena>) -> Result<Self, Errno> {
        let name = config.name;
        let device = Arc::new(ByteDevice::new(config.clone(), arena).map_err(|_| Errno::EINVAL)?);

        let major = host.register_chrdev(config.major, name, device.clone())?;

        if let Err(err) = device.attach() {
            // undo the registration before reporting
            if let Err(unreg) = host.unregister_chrdev(major, name) {
                log::warn!("{}: unregister of major {} failed: {}", name, major, unreg);
            }
            return Err(err.into());
        }

        log::info!("{} byte device module loaded at major {}", name, major);
        Ok(Self {
            device,
            major,
            loaded: true,
        })
    }

    pub fn exit(&mut self, host: &Host) {
        if !self.loaded {
            return;
        }
        self.device.detach();
        let name = self.device.config().name;
        if let Err(err) = host.unregister_chrdev(self.major, name) {
            log::warn!("{}: unregister of major {} failed: {}", name, self.major, err);
        }
        self.loaded = false;
        log::info!("{} byte device module is unloaded", name);
    }

    pub fn device(&self) -> &Arc<ByteDevice> {
        &self.device
    }

    /// Major the device was registered under
    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}
