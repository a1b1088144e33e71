//! Callback surface the byte-code interpreter drives.
//!
//! [`HardwareAccess`] is the device backend the caller owns (MMIO, PCI config, VRAM, indirect
//! PLL/MC registers). [`CailCallbacks`] is what the interpreter sees: register and PCI indices in
//! dwords, scratch offsets relative to the bound scratch region. [`CailContext`] maps one onto the
//! other for the duration of a single command execution.

use std::time::Duration;

use crate::scratch::ScratchRegion;

/// Access width for PCI configuration space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PciWidth {
    U8,
    U16,
    U32,
}

impl PciWidth {
    /// Maps an interpreter size operand in bits (8, 16 or 32).
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(PciWidth::U8),
            16 => Some(PciWidth::U16),
            32 => Some(PciWidth::U32),
            _ => None,
        }
    }

    pub fn mask(self) -> u32 {
        match self {
            PciWidth::U8 => 0xFF,
            PciWidth::U16 => 0xFFFF,
            PciWidth::U32 => u32::MAX,
        }
    }
}

/// Device backend for one graphics adapter.
///
/// Offsets passed here are byte offsets; index scaling is done by [`CailContext`].
pub trait HardwareAccess {
    fn mmio_read_u32(&mut self, offset: u32) -> u32;
    fn mmio_write_u32(&mut self, offset: u32, value: u32);

    fn pci_config_read(&mut self, offset: u32, width: PciWidth) -> u32;
    fn pci_config_write(&mut self, offset: u32, width: PciWidth, value: u32);

    /// Indirect PLL register read.
    fn pll_read(&mut self, index: u32) -> u32;
    fn pll_write(&mut self, index: u32, value: u32);

    /// Indirect memory-controller register read.
    fn mc_read(&mut self, index: u32) -> u32;
    fn mc_write(&mut self, index: u32, value: u32);

    fn vram_read_u8(&mut self, addr: u64) -> u8;
    fn vram_write_u8(&mut self, addr: u64, value: u8);

    fn vram_read_u32(&mut self, addr: u64) -> u32 {
        let b0 = self.vram_read_u8(addr) as u32;
        let b1 = self.vram_read_u8(addr.wrapping_add(1)) as u32;
        let b2 = self.vram_read_u8(addr.wrapping_add(2)) as u32;
        let b3 = self.vram_read_u8(addr.wrapping_add(3)) as u32;
        b0 | (b1 << 8) | (b2 << 16) | (b3 << 24)
    }

    fn vram_write_u32(&mut self, addr: u64, value: u32) {
        self.vram_write_u8(addr, value as u8);
        self.vram_write_u8(addr.wrapping_add(1), (value >> 8) as u8);
        self.vram_write_u8(addr.wrapping_add(2), (value >> 16) as u8);
        self.vram_write_u8(addr.wrapping_add(3), (value >> 24) as u8);
    }

    /// Whether the framebuffer aperture is currently mapped for CPU access.
    fn framebuffer_mapped(&self) -> bool {
        true
    }

    fn delay_us(&mut self, micros: u32) {
        std::thread::sleep(Duration::from_micros(u64::from(micros)));
    }
}

/// Callbacks available to the interpreter while a command table runs.
pub trait CailCallbacks {
    /// Reads MMIO register `index` (a dword index).
    fn read_register(&mut self, index: u32) -> u32;
    fn write_register(&mut self, index: u32, value: u32);

    /// Reads the dword at byte `offset` inside the scratch region.
    fn read_scratch(&mut self, offset: u32) -> u32;
    fn write_scratch(&mut self, offset: u32, value: u32);

    /// Reads PCI config space at dword `index`.
    fn read_pci_config(&mut self, index: u32, width: PciWidth) -> u32;
    fn write_pci_config(&mut self, index: u32, width: PciWidth, value: u32);

    fn read_pll(&mut self, index: u32) -> u32;
    fn write_pll(&mut self, index: u32, value: u32);

    fn read_mc(&mut self, index: u32) -> u32;
    fn write_mc(&mut self, index: u32, value: u32);

    fn delay_microseconds(&mut self, micros: u32);
}

/// Per-execution binding of the hardware backend and the scratch region.
pub struct CailContext<'a, H: HardwareAccess + ?Sized> {
    hw: &'a mut H,
    scratch: &'a mut ScratchRegion,
}

impl<'a, H: HardwareAccess + ?Sized> CailContext<'a, H> {
    pub fn new(hw: &'a mut H, scratch: &'a mut ScratchRegion) -> Self {
        Self { hw, scratch }
    }

    fn scratch_in_bounds(&self, offset: u32) -> bool {
        u64::from(offset) + 4 <= self.scratch.len()
    }
}

impl<H: HardwareAccess + ?Sized> CailCallbacks for CailContext<'_, H> {
    fn read_register(&mut self, index: u32) -> u32 {
        let value = self.hw.mmio_read_u32(index << 2);
        tracing::trace!(offset = index << 2, value, "register read");
        value
    }

    fn write_register(&mut self, index: u32, value: u32) {
        tracing::trace!(offset = index << 2, value, "register write");
        self.hw.mmio_write_u32(index << 2, value);
    }

    fn read_scratch(&mut self, offset: u32) -> u32 {
        if !self.scratch_in_bounds(offset) {
            tracing::error!(offset, len = self.scratch.len(), "scratch read out of range");
            return 0;
        }
        let value = match &*self.scratch {
            ScratchRegion::Vram { base, .. } => self.hw.vram_read_u32(base + u64::from(offset)),
            ScratchRegion::Host(buf) => {
                let at = offset as usize;
                u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
            }
        };
        tracing::trace!(offset, value, "scratch read");
        value
    }

    fn write_scratch(&mut self, offset: u32, value: u32) {
        if !self.scratch_in_bounds(offset) {
            tracing::error!(offset, len = self.scratch.len(), "scratch write out of range");
            return;
        }
        tracing::trace!(offset, value, "scratch write");
        match &mut *self.scratch {
            ScratchRegion::Vram { base, .. } => {
                let addr = *base + u64::from(offset);
                self.hw.vram_write_u32(addr, value);
            }
            ScratchRegion::Host(buf) => {
                let at = offset as usize;
                buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
            }
        }
    }

    fn read_pci_config(&mut self, index: u32, width: PciWidth) -> u32 {
        let value = self.hw.pci_config_read(index << 2, width) & width.mask();
        tracing::trace!(offset = index << 2, ?width, value, "pci config read");
        value
    }

    fn write_pci_config(&mut self, index: u32, width: PciWidth, value: u32) {
        tracing::trace!(offset = index << 2, ?width, value, "pci config write");
        self.hw
            .pci_config_write(index << 2, width, value & width.mask());
    }

    fn read_pll(&mut self, index: u32) -> u32 {
        let value = self.hw.pll_read(index);
        tracing::trace!(index, value, "pll read");
        value
    }

    fn write_pll(&mut self, index: u32, value: u32) {
        tracing::trace!(index, value, "pll write");
        self.hw.pll_write(index, value);
    }

    fn read_mc(&mut self, index: u32) -> u32 {
        let value = self.hw.mc_read(index);
        tracing::trace!(index, value, "mc read");
        value
    }

    fn write_mc(&mut self, index: u32, value: u32) {
        tracing::trace!(index, value, "mc write");
        self.hw.mc_write(index, value);
    }

    fn delay_microseconds(&mut self, micros: u32) {
        self.hw.delay_us(micros);
    }
}
