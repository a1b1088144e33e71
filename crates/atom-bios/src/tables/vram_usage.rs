use crate::bytes::{read_u16_le, read_u32_le};
use crate::ids::DataTableId;
use crate::rom::TableRevision;
use crate::tables::{Decoder, VersionedTable};

/// VRAM the firmware reserves for its own scratch use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VramReservation {
    /// Start address within the framebuffer.
    pub start_address: u32,
    pub size_kib: u16,
}

impl VramReservation {
    pub fn size_bytes(&self) -> u64 {
        u64::from(self.size_kib) * 1024
    }
}

/// Decoded `VRAM_UsageByFirmware` data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VramUsage {
    V1_1(VramReservation),
}

impl VramUsage {
    pub fn reservation(&self) -> VramReservation {
        match self {
            VramUsage::V1_1(r) => *r,
        }
    }
}

impl VersionedTable for VramUsage {
    const TABLE: DataTableId = DataTableId::VramUsageByFirmware;
    const DECODERS: &'static [Decoder<Self>] = &[Decoder {
        revision: TableRevision::new(1, 1),
        min_len: 10,
        decode: decode_v1_1,
    }];
}

fn decode_v1_1(b: &[u8]) -> Option<VramUsage> {
    Some(VramUsage::V1_1(VramReservation {
        start_address: read_u32_le(b, 4)?,
        size_kib: read_u16_le(b, 8)?,
    }))
}
