use std::process::{Command, Output};

use pretty_assertions::assert_eq;

fn ia32jit(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ia32jit"))
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to spawn ia32jit")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
#[test]
fn dump_prints_the_encoded_program() {
    let output = ia32jit(&["dump"]);
    assert!(output.status.success());

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("C7 C0 04 00 00 00 C7 C3 01 00 00 00 C7 C1"));
    assert_eq!(lines[2], "C7 C3 00 00 00 00 CD 80");
}

#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
#[test]
fn listing_prints_each_instruction() {
    let output = ia32jit(&["listing", "--exit-code", "3", "--message", "hi"]);
    assert!(output.status.success());

    let text = stdout(&output);
    let listing: Vec<&str> = text
        .lines()
        .map(|line| line.split_once(' ').map_or(line, |(_, inst)| inst))
        .collect();

    assert_eq!(listing.len(), 8);
    assert_eq!(listing[0], "mov eax, 0x4");
    assert!(listing[2].starts_with("mov ecx, 0x"));
    assert_eq!(listing[3], "mov edx, 0x2");
    assert_eq!(listing[6], "mov ebx, 0x3");
    assert_eq!(listing[7], "int 0x80");
}

#[test]
fn sentinel_exit_code_is_rejected() {
    let output = ia32jit(&["dump", "--exit-code", "255"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));
}

// int 0x80 needs a kernel built with IA-32 emulation, which plenty of CI sandboxes lack
#[cfg(all(target_os = "linux", any(target_arch = "x86", target_arch = "x86_64")))]
#[test]
#[ignore = "requires IA-32 system call emulation"]
fn generated_code_writes_and_exits() {
    let output = ia32jit(&[]);
    assert_eq!(stdout(&output), "Hello, world!\n");
    assert_eq!(output.status.code(), Some(0));

    let output = ia32jit(&["--message", "bye\n", "--exit-code", "7"]);
    assert_eq!(stdout(&output), "bye\n");
    assert_eq!(output.status.code(), Some(7));
}
