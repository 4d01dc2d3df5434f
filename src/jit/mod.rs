pub mod codegen;
pub mod memory;

use std::{io, mem, ptr::NonNull};

use thiserror::Error;

use self::{
    codegen::{EncodeError, InstructionStream},
    memory::{MemoryMapper, Protection},
};

/// Exit status for anything that goes wrong before control reaches the generated code.
/// The generated programs never pick it (exit codes are capped below it).
pub const SENTINEL_EXIT_STATUS: i32 = 255;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Failed to map {len} bytes: {source}")]
    Allocation {
        len: usize,
        #[source]
        source: io::Error,
    },

    #[error("Region of {region} bytes can't hold {required} bytes")]
    RegionTooSmall { region: usize, required: usize },
}

#[derive(Error, Debug)]
pub enum JitError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Harness(#[from] HarnessError),
}

impl JitError {
    pub fn exit_status(&self) -> i32 {
        match self {
            JitError::Encode(_) | JitError::Harness(_) => SENTINEL_EXIT_STATUS,
        }
    }
}

/// Write + execute memory holding one generated program.
///
/// Never unmapped, the generated code ends the process and the kernel cleans up.
#[derive(Debug)]
pub struct ExecutableRegion {
    memory: NonNull<u8>,
    len: usize,
}

impl ExecutableRegion {
    pub fn acquire<M: MemoryMapper>(mapper: &M, len: usize) -> Result<Self, HarnessError> {
        let memory = mapper.map(len, Protection::WRITE | Protection::EXEC)?;
        Ok(ExecutableRegion { memory, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copies `bytes` to the start of the region
    pub fn populate(&mut self, bytes: &[u8]) -> Result<(), HarnessError> {
        if bytes.len() > self.len {
            return Err(HarnessError::RegionTooSmall {
                region: self.len,
                required: bytes.len(),
            });
        }

        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.memory.as_ptr(), bytes.len());
        }
        Ok(())
    }

    /// Jumps to byte 0 of the region.  Control never comes back, the generated code has to
    /// end the process itself.
    ///
    /// # Safety
    /// The region must hold a complete, valid instruction stream for the host CPU that
    /// terminates the process.  Whatever the CPU does with a bad stream (fault, illegal
    /// instruction) is not caught here.
    pub unsafe fn invoke(self) -> ! {
        let entry: extern "C" fn() -> ! = mem::transmute(self.memory.as_ptr());
        entry()
    }
}

/// Turns finished instruction streams into runnable regions
pub struct ExecutionHarness<M: MemoryMapper> {
    mapper: M,
}

impl<M: MemoryMapper> ExecutionHarness<M> {
    pub fn new(mapper: M) -> Self {
        Self { mapper }
    }

    /// Acquires a region sized exactly to the encoded stream and copies it in
    pub fn load(&self, stream: &InstructionStream) -> Result<ExecutableRegion, HarnessError> {
        let bytes = stream.to_vec_u8();
        let mut region = ExecutableRegion::acquire(&self.mapper, bytes.len())?;
        region.populate(&bytes)?;
        Ok(region)
    }

    /// Copies `bytes` into readable memory that outlives the program, for data the generated
    /// code points at
    pub fn place_data(&self, bytes: &[u8]) -> Result<&'static [u8], HarnessError> {
        // an empty message still needs an address
        let memory = self
            .mapper
            .map(bytes.len().max(1), Protection::READ | Protection::WRITE)?;

        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), memory.as_ptr(), bytes.len());
            Ok(std::slice::from_raw_parts(memory.as_ptr(), bytes.len()))
        }
    }
}
