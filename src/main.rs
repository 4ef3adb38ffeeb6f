//! NES emulator entry point.
//!
//! Loads a cartridge and runs it in a window, or headless for automated test ROMs.
//! Usage: latchnes [OPTIONS] <ROM>

use std::cell::Cell;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;
use std::time::{Duration, Instant};

use clap::Parser;
use latchnes::cartridge::cartridge::Cartridge;
use latchnes::controller::Button;
use latchnes::logger;
use latchnes::nes::{Nes, TestStatus};
use latchnes::palette::Palette;
use latchnes::ppu::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};
use log::LevelFilter;
use minifb::{Key, Window, WindowOptions};

/// NES runs at ~60.0988 Hz (NTSC). Target one frame per 16.67 ms for ~60 fps.
const FRAME_DURATION: Duration = Duration::from_nanos(16_666_667);

/// Entry point of nestest's automated mode.
const NESTEST_ENTRY: u16 = 0xC000;

#[derive(Parser, Debug)]
#[command(name = "latchnes", version, about = "Cycle-accurate NES emulator")]
struct Args {
    /// iNES ROM image
    rom: PathBuf,

    /// 64-entry .pal file replacing the built-in palette
    #[arg(long, value_name = "FILE")]
    palette: Option<PathBuf>,

    /// Start at $C000 instead of the reset vector (nestest automation)
    #[arg(long)]
    nestest: bool,

    /// Log every instruction in nestest format
    #[arg(long)]
    trace: bool,

    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LevelFilter,

    /// Run without a window
    #[arg(long)]
    headless: bool,

    /// Stop a headless run after this many frames
    #[arg(long, value_name = "N")]
    frames: Option<u64>,
}

/// Keyboard layout, in [`Button::ALL`] order.
const KEYMAP: [Key; 8] = [
    Key::Z,
    Key::X,
    Key::RightShift,
    Key::Enter,
    Key::Up,
    Key::Down,
    Key::Left,
    Key::Right,
];

fn main() {
    let args = Args::parse();

    let level = if args.trace {
        LevelFilter::Trace
    } else {
        args.log_level
    };
    if let Err(err) = logger::init(level) {
        eprintln!("logger: {}", err);
    }

    let cart = match Cartridge::load(&args.rom) {
        Ok(cart) => cart,
        Err(err) => {
            log::error!("{}: {}", args.rom.display(), err);
            process::exit(1);
        }
    };
    let palette = match &args.palette {
        Some(path) => match Palette::load(path) {
            Ok(palette) => palette,
            Err(err) => {
                log::error!("{}: {}", path.display(), err);
                process::exit(1);
            }
        },
        None => Palette::default(),
    };

    let mut nes = Nes::new(cart);
    if args.nestest {
        nes.cpu.pc = NESTEST_ENTRY;
    }
    log::info!("loaded {}", args.rom.display());

    if args.headless {
        process::exit(run_headless(&mut nes, args.frames));
    }
    run_window(&mut nes, &palette);
}

/// Run frames until the limit, a jam, or a finished test ROM. Returns the exit code.
fn run_headless(nes: &mut Nes, frames: Option<u64>) -> i32 {
    let mut frame = 0;
    let mut reset_done = false;
    while frames.is_none_or(|limit| frame < limit) {
        nes.run_frame();
        frame += 1;

        if nes.cpu.killed {
            log::error!("CPU jammed after {} frames", frame);
            return 1;
        }
        match nes.test_status() {
            Some(status) if status.is_finished() => {
                println!("{}", status.message.trim_end());
                return status.code as i32;
            }
            // The ROM asks for the reset button once per request
            Some(status) if status.code == TestStatus::NEEDS_RESET => {
                if !reset_done {
                    log::info!("test ROM requested reset");
                    nes.reset();
                    reset_done = true;
                }
            }
            _ => reset_done = false,
        }
    }

    match nes.test_status() {
        Some(status) => {
            println!("{}", status.message.trim_end());
            log::warn!("test still running after {} frames", frame);
            1
        }
        None => 0,
    }
}

fn run_window(nes: &mut Nes, palette: &Palette) {
    let mut window = match Window::new(
        "latchnes",
        SCREEN_WIDTH,
        SCREEN_HEIGHT,
        WindowOptions {
            resize: true,
            scale: minifb::Scale::X2,
            scale_mode: minifb::ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        },
    ) {
        Ok(window) => window,
        Err(err) => {
            log::error!("failed to create window: {}", err);
            process::exit(1);
        }
    };

    // Refreshed once per frame; the controller samples it on strobe
    let pad = Rc::new(Cell::new(0u8));
    let buttons = Rc::clone(&pad);
    nes.bus_mut().controllers[0].connect(move |button: Button| {
        let bit = Button::ALL.iter().position(|&b| b == button).unwrap_or(0);
        buttons.get() & (1 << bit) != 0
    });

    let mut buffer = vec![0u32; SCREEN_WIDTH * SCREEN_HEIGHT];

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let frame_start = Instant::now();

        let state = KEYMAP
            .iter()
            .enumerate()
            .filter(|&(_, &key)| window.is_key_down(key))
            .fold(0u8, |state, (bit, _)| state | 1 << bit);
        pad.set(state);

        nes.run_frame();
        if nes.cpu.killed {
            log::error!("CPU jammed at ${:04X}", nes.cpu.pc);
            break;
        }

        palette.render(nes.frame(), &mut buffer);
        if let Err(err) = window.update_with_buffer(&buffer, SCREEN_WIDTH, SCREEN_HEIGHT) {
            log::error!("failed to update window: {}", err);
            break;
        }

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }
}
