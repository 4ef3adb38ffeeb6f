//! OAM DMA unit ($4014).
//!
//! A write of page `P` to $4014 copies $P00–$PFF into OAM through $2004. The unit waits for an
//! even CPU cycle, then alternates a read cycle and a write cycle 256 times. The CPU is halted
//! while the copy runs. See [DMA](https://www.nesdev.org/wiki/DMA).

pub const DMA_TRANSFERS: u16 = 256;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DmaState {
    #[default]
    Idle,
    Waiting,
    Running,
}

/// Bus work requested by the DMA unit for one CPU cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DmaCycle {
    Read(u16),
    Write(u8),
}

#[derive(Debug, Default)]
pub struct Dma {
    state: DmaState,
    base: u16,
    transfers: u16,
    data: u8,
    write_next: bool,
}

impl Dma {
    pub fn trigger(&mut self, page: u8) {
        log::debug!("OAM DMA from ${:02X}00", page);
        self.state = DmaState::Waiting;
        self.base = (page as u16) << 8;
        self.transfers = 0;
        self.write_next = false;
    }

    pub fn state(&self) -> DmaState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DmaState::Running
    }

    pub fn transfers_complete(&self) -> u16 {
        self.transfers
    }

    /// Byte fetched by the last read cycle.
    pub fn latch(&mut self, data: u8) {
        self.data = data;
    }

    /// Advance one CPU cycle. `cycle` is the bus's CPU cycle counter, used for alignment.
    pub fn step(&mut self, cycle: u64) -> Option<DmaCycle> {
        match self.state {
            DmaState::Idle => None,
            DmaState::Waiting => {
                if cycle % 2 == 0 {
                    self.state = DmaState::Running;
                }
                None
            }
            DmaState::Running => {
                if !self.write_next {
                    self.write_next = true;
                    return Some(DmaCycle::Read(self.base + self.transfers));
                }

                self.write_next = false;
                self.transfers += 1;
                if self.transfers == DMA_TRANSFERS {
                    self.state = DmaState::Idle;
                }
                Some(DmaCycle::Write(self.data))
            }
        }
    }
}
