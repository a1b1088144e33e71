use bitflags::bitflags;

use crate::bytes::{read_u16_le, read_u32_le, read_u8};
use crate::ids::DataTableId;
use crate::rom::TableRevision;
use crate::tables::{Decoder, VersionedTable};

bitflags! {
    /// `usFirmwareCapability` bits.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct FirmwareCapability: u16 {
        const FIRMWARE_POSTED = 1 << 0;
        const DUAL_CRTC = 1 << 1;
        const EXTENDED_DESKTOP = 1 << 2;
        const MEMORY_CLOCK_SS = 1 << 3;
        const ENGINE_CLOCK_SS = 1 << 4;
        const GPU_CONTROLS_BL = 1 << 5;
        const WMI = 1 << 6;
        const PP_MODE_ASSIGNED = 1 << 7;
        const HYPER_MEMORY = 1 << 8;
    }
}

/// Fields every FirmwareInfo revision carries at the same offsets.
///
/// Clocks are in 10 kHz units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareInfoCommon {
    pub firmware_revision: u32,
    pub default_engine_clock: u32,
    pub default_memory_clock: u32,
    pub driver_target_engine_clock: u32,
    pub driver_target_memory_clock: u32,
    pub max_engine_pll_output: u32,
    pub max_memory_pll_output: u32,
    pub max_pixel_pll_output: u32,
    pub asic_max_engine_clock: u32,
    pub asic_max_memory_clock: u32,
    pub asic_max_temperature: u8,
    pub min_engine_pll_input: u16,
    pub max_engine_pll_input: u16,
    pub min_engine_pll_output: u16,
    pub min_memory_pll_input: u16,
    pub max_memory_pll_input: u16,
    pub min_memory_pll_output: u16,
    pub max_pixel_clock: u16,
    pub min_pixel_pll_input: u16,
    pub max_pixel_pll_input: u16,
    /// 16-bit minimum pixel PLL output. Later revisions add a 32-bit field that supersedes it.
    pub min_pixel_pll_output: u16,
    pub capability: FirmwareCapability,
    pub reference_clock: u16,
    pub pm_rts_location: u16,
    pub pm_rts_stream_size: u8,
    pub design_id: u8,
    pub memory_module_id: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareInfoV1_2 {
    pub common: FirmwareInfoCommon,
    pub min_backlight_level: u8,
    pub min_pixel_pll_output32: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareInfoV1_3 {
    pub common: FirmwareInfoCommon,
    pub min_backlight_level: u8,
    pub accel_3d_engine_clock: u32,
    pub min_pixel_pll_output32: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareInfoV1_4 {
    pub common: FirmwareInfoCommon,
    pub min_backlight_level: u8,
    /// Boot-up VDDC in mV.
    pub boot_vddc: u16,
    pub lcd_min_pixel_pll_output: u16,
    pub lcd_max_pixel_pll_output: u16,
    pub accel_3d_engine_clock: u32,
    pub min_pixel_pll_output32: u32,
}

/// Decoded `FirmwareInfo` data table, one variant per supported revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirmwareInfo {
    V1_1(FirmwareInfoCommon),
    V1_2(FirmwareInfoV1_2),
    V1_3(FirmwareInfoV1_3),
    V1_4(FirmwareInfoV1_4),
}

const COMMON_LEN: usize = 89;

impl FirmwareInfo {
    pub fn common(&self) -> &FirmwareInfoCommon {
        match self {
            FirmwareInfo::V1_1(common) => common,
            FirmwareInfo::V1_2(v) => &v.common,
            FirmwareInfo::V1_3(v) => &v.common,
            FirmwareInfo::V1_4(v) => &v.common,
        }
    }

    pub fn revision(&self) -> TableRevision {
        match self {
            FirmwareInfo::V1_1(_) => TableRevision::new(1, 1),
            FirmwareInfo::V1_2(_) => TableRevision::new(1, 2),
            FirmwareInfo::V1_3(_) => TableRevision::new(1, 3),
            FirmwareInfo::V1_4(_) => TableRevision::new(1, 4),
        }
    }

    /// Minimum pixel PLL output frequency.
    ///
    /// Revisions from 1.2 on carry a 32-bit field; when the firmware leaves it zero the 16-bit
    /// field of 1.1 is used instead.
    pub fn min_pixel_pll_output(&self) -> u32 {
        let wide = match self {
            FirmwareInfo::V1_1(_) => 0,
            FirmwareInfo::V1_2(v) => v.min_pixel_pll_output32,
            FirmwareInfo::V1_3(v) => v.min_pixel_pll_output32,
            FirmwareInfo::V1_4(v) => v.min_pixel_pll_output32,
        };
        if wide != 0 {
            wide
        } else {
            u32::from(self.common().min_pixel_pll_output)
        }
    }

    pub fn min_backlight_level(&self) -> Option<u8> {
        match self {
            FirmwareInfo::V1_1(_) => None,
            FirmwareInfo::V1_2(v) => Some(v.min_backlight_level),
            FirmwareInfo::V1_3(v) => Some(v.min_backlight_level),
            FirmwareInfo::V1_4(v) => Some(v.min_backlight_level),
        }
    }
}

impl VersionedTable for FirmwareInfo {
    const TABLE: DataTableId = DataTableId::FirmwareInfo;
    const DECODERS: &'static [Decoder<Self>] = &[
        Decoder {
            revision: TableRevision::new(1, 1),
            min_len: COMMON_LEN,
            decode: decode_v1_1,
        },
        Decoder {
            revision: TableRevision::new(1, 2),
            min_len: COMMON_LEN,
            decode: decode_v1_2,
        },
        Decoder {
            revision: TableRevision::new(1, 3),
            min_len: COMMON_LEN,
            decode: decode_v1_3,
        },
        Decoder {
            revision: TableRevision::new(1, 4),
            min_len: COMMON_LEN,
            decode: decode_v1_4,
        },
    ];
}

fn decode_common(b: &[u8]) -> Option<FirmwareInfoCommon> {
    Some(FirmwareInfoCommon {
        firmware_revision: read_u32_le(b, 4)?,
        default_engine_clock: read_u32_le(b, 8)?,
        default_memory_clock: read_u32_le(b, 12)?,
        driver_target_engine_clock: read_u32_le(b, 16)?,
        driver_target_memory_clock: read_u32_le(b, 20)?,
        max_engine_pll_output: read_u32_le(b, 24)?,
        max_memory_pll_output: read_u32_le(b, 28)?,
        max_pixel_pll_output: read_u32_le(b, 32)?,
        asic_max_engine_clock: read_u32_le(b, 36)?,
        asic_max_memory_clock: read_u32_le(b, 40)?,
        asic_max_temperature: read_u8(b, 44)?,
        min_engine_pll_input: read_u16_le(b, 60)?,
        max_engine_pll_input: read_u16_le(b, 62)?,
        min_engine_pll_output: read_u16_le(b, 64)?,
        min_memory_pll_input: read_u16_le(b, 66)?,
        max_memory_pll_input: read_u16_le(b, 68)?,
        min_memory_pll_output: read_u16_le(b, 70)?,
        max_pixel_clock: read_u16_le(b, 72)?,
        min_pixel_pll_input: read_u16_le(b, 74)?,
        max_pixel_pll_input: read_u16_le(b, 76)?,
        min_pixel_pll_output: read_u16_le(b, 78)?,
        capability: FirmwareCapability::from_bits_retain(read_u16_le(b, 80)?),
        reference_clock: read_u16_le(b, 82)?,
        pm_rts_location: read_u16_le(b, 84)?,
        pm_rts_stream_size: read_u8(b, 86)?,
        design_id: read_u8(b, 87)?,
        memory_module_id: read_u8(b, 88)?,
    })
}

fn decode_v1_1(b: &[u8]) -> Option<FirmwareInfo> {
    decode_common(b).map(FirmwareInfo::V1_1)
}

fn decode_v1_2(b: &[u8]) -> Option<FirmwareInfo> {
    Some(FirmwareInfo::V1_2(FirmwareInfoV1_2 {
        common: decode_common(b)?,
        min_backlight_level: read_u8(b, 45)?,
        min_pixel_pll_output32: read_u32_le(b, 56)?,
    }))
}

fn decode_v1_3(b: &[u8]) -> Option<FirmwareInfo> {
    Some(FirmwareInfo::V1_3(FirmwareInfoV1_3 {
        common: decode_common(b)?,
        min_backlight_level: read_u8(b, 45)?,
        accel_3d_engine_clock: read_u32_le(b, 52)?,
        min_pixel_pll_output32: read_u32_le(b, 56)?,
    }))
}

fn decode_v1_4(b: &[u8]) -> Option<FirmwareInfo> {
    Some(FirmwareInfo::V1_4(FirmwareInfoV1_4 {
        common: decode_common(b)?,
        min_backlight_level: read_u8(b, 45)?,
        boot_vddc: read_u16_le(b, 46)?,
        lcd_min_pixel_pll_output: read_u16_le(b, 48)?,
        lcd_max_pixel_pll_output: read_u16_le(b, 50)?,
        accel_3d_engine_clock: read_u32_le(b, 52)?,
        min_pixel_pll_output32: read_u32_le(b, 56)?,
    }))
}
