/*
 * User Memory Access Checks
 *
 * Before a device or a syscall handler touches a caller-supplied region
 * it asks the host whether that region is accessible for the direction
 * of the transfer. The host decides what "user memory" means; the
 * default is the canonical lower half of the x86_64 address space.
 *
 * Security considerations:
 * - A region is rejected if it starts at NULL
 * - A region is rejected if it reaches into the kernel half
 * - A region is rejected if its end address overflows
 */

/// Direction of an access, seen from the kernel side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Kernel reads from the region (copy_from_user)
    Read,
    /// Kernel writes into the region (copy_to_user)
    Write,
}

/// Host policy deciding whether a user region may be accessed
pub trait UserAccess: Send + Sync {
    fn access_ok(&self, addr: usize, len: usize, access: Access) -> bool;
}

/// First address above the canonical user half
pub const USER_SPACE_END: usize = 0x0000_8000_0000_0000;

/// Lower-half address range check
///
/// Read and write access are treated alike: the check is on the range,
/// not on page permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSpace {
    end: usize,
}

impl UserSpace {
    pub const fn canonical() -> Self {
        Self { end: USER_SPACE_END }
    }

    /// Restrict user space to `[0, end)`
    pub const fn below(end: usize) -> Self {
        Self { end }
    }
}

impl Default for UserSpace {
    fn default() -> Self {
        Self::canonical()
    }
}

impl UserAccess for UserSpace {
    fn access_ok(&self, addr: usize, len: usize, _access: Access) -> bool {
        if addr == 0 {
            return false;
        }
        match addr.checked_add(len) {
            Some(end) => end <= self.end,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_null_kernel_and_overflowing_regions() {
        let user = UserSpace::canonical();
        assert!(user.access_ok(0x1000, 64, Access::Read));
        assert!(user.access_ok(USER_SPACE_END - 8, 8, Access::Write));
        assert!(!user.access_ok(0, 1, Access::Read));
        assert!(!user.access_ok(USER_SPACE_END - 8, 9, Access::Write));
        assert!(!user.access_ok(0xffff_ffff_c000_0000, 1, Access::Read));
        assert!(!user.access_ok(usize::MAX, 2, Access::Read));
    }

    #[test]
    fn narrowed_user_space() {
        let user = UserSpace::below(0x2000);
        assert!(user.access_ok(0x1000, 0x1000, Access::Read));
        assert!(!user.access_ok(0x1000, 0x1001, Access::Read));
    }
}
