//! nestest automation run compared against the reference log, instruction by instruction.
//!
//! Needs `roms/nestest.nes` and `roms/nestest.log`, which are not shipped:
//! `cargo test --test nestest -- --ignored`

use std::fs;
use std::path::Path;

use latchnes::cartridge::cartridge::Cartridge;
use latchnes::nes::Nes;

#[derive(Debug, PartialEq, Eq)]
struct Snapshot {
    pc: u16,
    a: u8,
    x: u8,
    y: u8,
    p: u8,
    sp: u8,
    cycles: u64,
}

fn field<'a>(line: &'a str, key: &str) -> &'a str {
    let start = line
        .find(key)
        .unwrap_or_else(|| panic!("no {} in {:?}", key, line))
        + key.len();
    line[start..].split_whitespace().next().unwrap_or_default()
}

fn hex_u8(line: &str, key: &str) -> u8 {
    u8::from_str_radix(field(line, key), 16).expect("hex register")
}

fn parse(line: &str) -> Snapshot {
    Snapshot {
        pc: u16::from_str_radix(&line[..4], 16).expect("hex PC"),
        a: hex_u8(line, " A:"),
        x: hex_u8(line, " X:"),
        y: hex_u8(line, " Y:"),
        p: hex_u8(line, " P:"),
        sp: hex_u8(line, " SP:"),
        cycles: field(line, " CYC:").parse().expect("decimal cycle count"),
    }
}

fn snapshot(nes: &Nes) -> Snapshot {
    let cpu = &nes.cpu;
    Snapshot {
        pc: cpu.pc,
        a: cpu.a,
        x: cpu.x,
        y: cpu.y,
        p: cpu.status,
        sp: cpu.sp,
        cycles: cpu.cycles,
    }
}

#[test]
#[ignore = "needs roms/nestest.nes and roms/nestest.log"]
fn matches_reference_log() {
    let roms = Path::new(env!("CARGO_MANIFEST_DIR")).join("roms");
    let cart = Cartridge::load(roms.join("nestest.nes")).expect("nestest.nes");
    let log = fs::read_to_string(roms.join("nestest.log")).expect("nestest.log");

    let mut nes = Nes::new(cart);
    nes.cpu.pc = 0xC000;
    nes.tick_until_cpu_complete();

    for (number, line) in log.lines().filter(|line| !line.trim().is_empty()).enumerate() {
        let expected = parse(line);
        let actual = snapshot(&nes);
        assert_eq!(actual, expected, "line {}: {}", number + 1, line);
        assert!(!nes.cpu.killed, "jammed at line {}", number + 1);
        nes.step_instruction();
    }

    // Official and unofficial opcode results
    assert_eq!(nes.bus().ram[0x02], 0x00);
    assert_eq!(nes.bus().ram[0x03], 0x00);
}
