/*
 * ioctl Command Encoding
 *
 * Device commands travel as a single u32 using the Linux `_IOC` layout:
 *
 *   31    30 29            16 15        8 7          0
 *   [ dir  ][     size      ][   type   ][    nr    ]
 *
 * - dir:  transfer direction seen from the caller (WRITE = caller hands
 *         data to the device, READ = device hands data back)
 * - size: payload size in bytes
 * - type: command family tag ("magic"), one per driver
 * - nr:   command number within the family
 *
 * Inside the kernel commands are an enum; the numeric form only exists at
 * the boundary (`Command::code` / `Command::decode`).
 */

use bitflags::bitflags;

use crate::devices::DeviceError;

pub const IOC_NRBITS: u32 = 8;
pub const IOC_TYPEBITS: u32 = 8;
pub const IOC_SIZEBITS: u32 = 14;
pub const IOC_DIRBITS: u32 = 2;

pub const IOC_NRSHIFT: u32 = 0;
pub const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
pub const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
pub const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + IOC_SIZEBITS;

const IOC_NRMASK: u32 = (1 << IOC_NRBITS) - 1;
const IOC_TYPEMASK: u32 = (1 << IOC_TYPEBITS) - 1;
const IOC_SIZEMASK: u32 = (1 << IOC_SIZEBITS) - 1;
const IOC_DIRMASK: u32 = (1 << IOC_DIRBITS) - 1;

bitflags! {
    /// Transfer direction bits of an ioctl number
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IocDir: u32 {
        const WRITE = 1;
        const READ = 2;
    }
}

/// Build an ioctl number (`_IOC`)
pub const fn ioc(dir: IocDir, ty: u8, nr: u8, size: u32) -> u32 {
    (dir.bits() << IOC_DIRSHIFT)
        | ((size & IOC_SIZEMASK) << IOC_SIZESHIFT)
        | ((ty as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
}

/// Command without payload (`_IO`)
pub const fn io(ty: u8, nr: u8) -> u32 {
    ioc(IocDir::empty(), ty, nr, 0)
}

/// Device returns `size` bytes to the caller (`_IOR`)
pub const fn ior(ty: u8, nr: u8, size: u32) -> u32 {
    ioc(IocDir::READ, ty, nr, size)
}

/// Caller passes `size` bytes to the device (`_IOW`)
pub const fn iow(ty: u8, nr: u8, size: u32) -> u32 {
    ioc(IocDir::WRITE, ty, nr, size)
}

/// Both directions (`_IOWR`)
pub const fn iowr(ty: u8, nr: u8, size: u32) -> u32 {
    ioc(IocDir::READ.union(IocDir::WRITE), ty, nr, size)
}

/// Command family tag of the 4mb device
pub const FOURMB_IOC_MAGIC: u8 = b'k';
/// Highest command number accepted in the family
pub const FOURMB_IOC_MAXNR: u8 = 14;
/// Diagnostic no-op, no payload
pub const FOURMB_HELLO: u32 = Command::Hello.code(FOURMB_IOC_MAGIC);

const HELLO_NR: u8 = 1;

/// Decoded view of a raw ioctl number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCommand(pub u32);

impl RawCommand {
    pub fn dir(self) -> IocDir {
        IocDir::from_bits_truncate((self.0 >> IOC_DIRSHIFT) & IOC_DIRMASK)
    }

    pub fn ty(self) -> u8 {
        ((self.0 >> IOC_TYPESHIFT) & IOC_TYPEMASK) as u8
    }

    pub fn nr(self) -> u8 {
        ((self.0 >> IOC_NRSHIFT) & IOC_NRMASK) as u8
    }

    pub fn size(self) -> usize {
        ((self.0 >> IOC_SIZESHIFT) & IOC_SIZEMASK) as usize
    }
}

/// Commands understood by the 4mb device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Hello,
}

impl Command {
    /// Numeric form within the family `magic`
    pub const fn code(self, magic: u8) -> u32 {
        match self {
            Command::Hello => io(magic, HELLO_NR),
        }
    }

    /// Look a validated command up in the handler table
    ///
    /// Number, direction and size must all match; the family was already
    /// checked by `validate`.
    pub fn decode(cmd: RawCommand) -> Option<Self> {
        match (cmd.nr(), cmd.dir().is_empty(), cmd.size()) {
            (HELLO_NR, true, 0) => Some(Command::Hello),
            _ => None,
        }
    }
}

/// Family and range gate
///
/// Rejects a command whose type is not `magic` or whose number is above
/// `max_nr`. Runs before anything looks at the argument.
pub fn validate(raw: u32, magic: u8, max_nr: u8) -> Result<RawCommand, DeviceError> {
    let cmd = RawCommand(raw);
    if cmd.ty() != magic || cmd.nr() > max_nr {
        return Err(DeviceError::UnsupportedCommand);
    }
    Ok(cmd)
}
