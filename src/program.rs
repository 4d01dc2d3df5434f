use ia32jit::asm_ia32;

use crate::jit::{
    codegen::{ops, EncodeError, InstructionStream, Register},
    memory::MemoryMapper,
    ExecutionHarness, JitError,
};

pub const HELLO_WORLD: &str = "Hello, world!\n";

/// Linux i386 system call numbers, passed in EAX to `int 0x80`
pub const SYS_EXIT: i32 = 1;
pub const SYS_WRITE: i32 = 4;

pub const STDOUT: i32 = 1;
pub const SYSCALL_VECTOR: u8 = 0x80;

/// write(STDOUT, message, len) followed by exit(exit_code)
pub fn emit_hello_world(message_address: i32, message_len: i32, exit_code: i32) -> InstructionStream {
    let mut stream = InstructionStream::new();

    asm_ia32! {
        stream:
        mov EAX, SYS_WRITE;
        mov EBX, STDOUT;
        mov ECX, message_address;
        mov EDX, message_len;
        int SYSCALL_VECTOR;

        mov EAX, SYS_EXIT;
        mov EBX, exit_code;
        int SYSCALL_VECTOR;
    }

    stream
}

/// Places `message` somewhere the generated code can address and encodes the program around it
pub fn hello_world<M: MemoryMapper>(
    harness: &ExecutionHarness<M>,
    message: &str,
    exit_code: u8,
) -> Result<InstructionStream, JitError> {
    let data = harness.place_data(message.as_bytes())?;
    let address = ops::address_immediate(data.as_ptr())?;
    let len = i32::try_from(data.len()).map_err(|_| EncodeError::UnsupportedOperand {
        operand: format!("length {}", data.len()),
        reason: "does not fit in a 32 bit immediate",
    })?;

    Ok(emit_hello_world(address, len, i32::from(exit_code)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn interrupt_count(bytes: &[u8]) -> usize {
        bytes.windows(2).filter(|pair| *pair == [0xCD, 0x80]).count()
    }

    #[test]
    fn hello_world_layout() {
        let bytes = emit_hello_world(0x0804_9000, 14, 0).to_vec_u8();

        assert_eq!(bytes.len(), 40);
        assert_eq!(&bytes[..6], &[0xC7, 0xC0, 0x04, 0x00, 0x00, 0x00]);
        assert_eq!(interrupt_count(&bytes), 2);

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0xC7, 0xC0, 0x04, 0x00, 0x00, 0x00, // mov eax, 4
            0xC7, 0xC3, 0x01, 0x00, 0x00, 0x00, // mov ebx, 1
            0xC7, 0xC1, 0x00, 0x90, 0x04, 0x08, // mov ecx, 0x8049000
            0xC7, 0xC2, 0x0E, 0x00, 0x00, 0x00, // mov edx, 14
            0xCD, 0x80,                         // int 0x80
            0xC7, 0xC0, 0x01, 0x00, 0x00, 0x00, // mov eax, 1
            0xC7, 0xC3, 0x00, 0x00, 0x00, 0x00, // mov ebx, 0
            0xCD, 0x80,                         // int 0x80
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn macro_matches_direct_calls() {
        let mut expected = InstructionStream::new();
        ops::mov(&mut expected, Register::EDX, -3);
        ops::int(&mut expected, 0x21);

        let mut stream = InstructionStream::new();
        asm_ia32! {
            stream:
            mov EDX, -3;
            int 0x21;
        }

        assert_eq!(stream.to_vec_u8(), expected.to_vec_u8());
    }

    #[test]
    fn exit_code_lands_in_ebx() {
        let bytes = emit_hello_world(0x1000, 5, 42).to_vec_u8();
        assert_eq!(&bytes[26..32], &[0xC7, 0xC0, 0x01, 0x00, 0x00, 0x00]);
        assert_eq!(&bytes[32..38], &[0xC7, 0xC3, 42, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn listing_reads_like_the_source() {
        let stream = emit_hello_world(0x1000, 14, 0);
        let listing: Vec<String> = stream.instructions().iter().map(|i| i.to_string()).collect();
        assert_eq!(
            listing,
            vec![
                "mov eax, 0x4",
                "mov ebx, 0x1",
                "mov ecx, 0x1000",
                "mov edx, 0xe",
                "int 0x80",
                "mov eax, 0x1",
                "mov ebx, 0x0",
                "int 0x80",
            ]
        );
    }

    #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
    #[test]
    fn message_is_addressable() {
        use crate::jit::memory::Mmap;

        let harness = ExecutionHarness::new(Mmap::low_address());
        let stream = hello_world(&harness, HELLO_WORLD, 0).unwrap();
        let bytes = stream.to_vec_u8();

        assert_eq!(bytes.len(), 40);
        // mov edx, 14
        assert_eq!(&bytes[18..24], &[0xC7, 0xC2, 0x0E, 0x00, 0x00, 0x00]);

        let address = i32::from_le_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]) as u32;
        let message = unsafe { std::slice::from_raw_parts(address as usize as *const u8, 14) };
        assert_eq!(message, HELLO_WORLD.as_bytes());
    }
}
