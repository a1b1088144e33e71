/// Image-independent knobs for an [`crate::AtomBios`] session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomBiosConfig {
    /// Image offset of the 16-bit pointer to the ROM header.
    ///
    /// Every AtomBIOS image stores it at `0x48`; overriding it is only useful for images that
    /// were extracted with a leading wrapper.
    pub rom_header_pointer: usize,

    /// Size, in KiB, of the host scratch buffer used when the firmware does not reserve VRAM.
    pub default_scratch_kib: u32,

    /// Granularity, in bytes, that a firmware VRAM reservation is rounded up to.
    ///
    /// Any value works; 0 and 1 leave the size as the firmware states it.
    pub scratch_alignment: u64,
}

impl AtomBiosConfig {
    /// Host scratch buffer size in bytes.
    pub fn default_scratch_bytes(&self) -> usize {
        self.default_scratch_kib as usize * 1024
    }
}

impl Default for AtomBiosConfig {
    fn default() -> Self {
        Self {
            rom_header_pointer: 0x48,
            default_scratch_kib: 20,
            scratch_alignment: 4096,
        }
    }
}
