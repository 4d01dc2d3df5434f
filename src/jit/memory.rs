use std::{io, ptr::NonNull};

use bitflags::bitflags;

use super::HarnessError;

bitflags! {
    /// `PROT_*` bits handed to the mapping primitive
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Protection : libc::c_int {
        const READ  = libc::PROT_READ;
        const WRITE = libc::PROT_WRITE;
        const EXEC  = libc::PROT_EXEC;
    }
}

/// Hands out anonymous, private mappings.
///
/// Implementations must return `Err` rather than an unusable pointer, callers never look
/// at memory from a failed mapping.
pub trait MemoryMapper {
    fn map(&self, len: usize, protection: Protection) -> Result<NonNull<u8>, HarnessError>;
}

// Only x86-64 Linux can ask for the low 2GiB, everywhere else we take what we are given
#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
const LOW_ADDRESS_FLAG: libc::c_int = libc::MAP_32BIT;
#[cfg(not(all(target_os = "linux", target_arch = "x86_64")))]
const LOW_ADDRESS_FLAG: libc::c_int = 0;

/// `mmap(2)` backed mapper, nothing it hands out is ever unmapped
#[derive(Debug, Default, Clone, Copy)]
pub struct Mmap {
    /// Request memory whose addresses fit in a 32 bit register
    pub low_address: bool,
}

impl Mmap {
    pub fn low_address() -> Self {
        Mmap { low_address: true }
    }
}

impl MemoryMapper for Mmap {
    fn map(&self, len: usize, protection: Protection) -> Result<NonNull<u8>, HarnessError> {
        let mut flags = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;
        if self.low_address {
            flags |= LOW_ADDRESS_FLAG;
        }

        let memory = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                protection.bits(),
                flags,
                -1,
                0,
            )
        };

        if memory == libc::MAP_FAILED {
            return Err(HarnessError::Allocation {
                len,
                source: io::Error::last_os_error(),
            });
        }

        NonNull::new(memory as *mut u8).ok_or_else(|| HarnessError::Allocation {
            len,
            source: io::Error::new(io::ErrorKind::Other, "mapping returned a null address"),
        })
    }
}
