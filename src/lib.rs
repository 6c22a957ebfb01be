/*
 * CLUU 4mb Byte Device
 *
 * A fixed-capacity character device ("4mb", major 61) and the kernel-side
 * glue that reaches it: the device abstraction layer, a chrdev registry,
 * a per-process file descriptor table, syscall handlers and the module
 * load/unload sequence.
 *
 * Why this is important:
 * - Shows the whole path of a character device, from syscall number to
 *   buffer copy, without any global device state
 * - Keeps the device's offset/size contract in one small, testable place
 * - Builds for the kernel (no_std + alloc) and tests on the host
 *
 * Layout:
 * - io:       Device trait, errno/stat, fd table, ioctl encoding, user checks
 * - devices:  the byte device, storage arenas, chrdev registry
 * - syscall:  Host context and syscall handlers
 * - module:   load/unload of the 4mb device
 * - config:   defaults and overrides
 * - utils:    logger backend
 */

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod config;
pub mod devices;
pub mod io;
pub mod module;
pub mod syscall;
pub mod utils;

pub use config::DeviceConfig;
pub use devices::{ByteDevice, DeviceError, GlobalArena, HeapArena, StorageArena};
pub use io::{Device, Errno, Session, Stat, Whence};
pub use module::FourMbModule;
pub use syscall::Host;
