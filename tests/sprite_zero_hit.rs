//! Sprite-0 hit against an opaque background, on a synthetic NROM board.

use latchnes::bus::{Bus, NesBus};
use latchnes::cartridge::cartridge::Cartridge;
use latchnes::ppu::ppu::STATUS_SPRITE_ZERO;

const OPAQUE_TILE: u8 = 1;
const TRANSPARENT_TILE: u8 = 0;

/// One PRG bank of NOPs and a CHR bank whose tile 1 is solid colour 1.
fn cartridge() -> Cartridge {
    let mut image = vec![b'N', b'E', b'S', 0x1A, 1, 1, 0, 0];
    image.resize(16, 0);

    let mut prg = vec![0xEA; 0x4000];
    prg[0x3FFC..0x3FFE].copy_from_slice(&[0x00, 0x80]);
    image.extend_from_slice(&prg);

    let mut chr = vec![0u8; 0x2000];
    let tile = OPAQUE_TILE as usize * 16;
    chr[tile..tile + 8].fill(0xFF);
    image.extend_from_slice(&chr);

    Cartridge::from_bytes(&image).expect("synthetic NROM image")
}

/// Nametable full of the opaque tile, sprite 0 at (9, 4) showing `sprite_tile` on lines 5–12,
/// background and sprites enabled everywhere.
fn bus_with_sprite(sprite_tile: u8) -> NesBus {
    let mut bus = NesBus::new(cartridge());

    for addr in 0x2000..0x23C0 {
        bus.write_from_ppu(addr, OPAQUE_TILE);
    }
    for (i, color) in [0x0F, 0x30, 0x16, 0x27].into_iter().enumerate() {
        bus.write_from_ppu(0x3F00 + i as u16, color);
        bus.write_from_ppu(0x3F10 + i as u16, color);
    }

    for (i, byte) in [4, sprite_tile, 0x00, 9].into_iter().enumerate() {
        bus.ppu.set_oam_byte(i as u8, byte);
    }
    // Park every other sprite below the screen
    for sprite in 1..64u8 {
        bus.ppu.set_oam_byte(sprite * 4, 0xF0);
    }

    bus.write(0x2001, 0x1E);
    bus
}

fn sprite_zero_hit(bus: &NesBus) -> bool {
    bus.ppu.status() & STATUS_SPRITE_ZERO != 0
}

/// Tick until the next PPU tick processes (`line`, `dot`).
fn run_until(bus: &mut NesBus, line: i16, dot: u16) {
    while !(bus.ppu.vcount == line && bus.ppu.hcount == dot && bus.ppu.phase() == 0) {
        bus.tick_ppu();
        assert!(!sprite_zero_hit(bus), "hit early at ({}, {})", bus.ppu.vcount, bus.ppu.hcount);
    }
}

#[test]
fn hit_sets_on_first_overlapping_dot() {
    let mut bus = bus_with_sprite(OPAQUE_TILE);

    run_until(&mut bus, 5, 10);
    assert!(!sprite_zero_hit(&bus));

    bus.tick_ppu();
    assert!(sprite_zero_hit(&bus));
}

#[test]
fn hit_stays_set_until_pre_render_line() {
    let mut bus = bus_with_sprite(OPAQUE_TILE);

    run_until(&mut bus, 5, 10);
    while bus.ppu.vcount != -1 {
        bus.tick_ppu();
        assert!(sprite_zero_hit(&bus));
    }
    // Cleared at dot 1 of the pre-render line
    while bus.ppu.hcount < 2 {
        bus.tick_ppu();
    }
    assert!(!sprite_zero_hit(&bus));
}

#[test]
fn transparent_sprite_never_hits() {
    let mut bus = bus_with_sprite(TRANSPARENT_TILE);

    let start = bus.ppu.frame_count;
    while bus.ppu.frame_count < start + 2 {
        bus.tick_ppu();
        assert!(!sprite_zero_hit(&bus));
    }
}
