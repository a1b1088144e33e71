use crate::bytes::{read_u16_le, read_u8};
use crate::ids::DataTableId;
use crate::rom::TableRevision;
use crate::tables::{Decoder, VersionedTable};

/// Number of per-frequency PLL settings in a TMDS_Info table.
pub const TMDS_PLL_SETTING_COUNT: usize = 4;

const SETTING_LEN: usize = 6;
const SETTINGS_AT: usize = 6;

/// TMDS PLL programming used up to `frequency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TmdsPllSetting {
    /// 10 kHz units.
    pub frequency: u16,
    pub charge_pump: u8,
    pub duty_cycle: u8,
    pub vco_gain: u8,
    pub voltage_swing: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmdsInfoV1_1 {
    pub max_frequency: u16,
    pub settings: [TmdsPllSetting; TMDS_PLL_SETTING_COUNT],
}

/// Decoded `TMDS_Info` data table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TmdsInfo {
    V1_1(TmdsInfoV1_1),
}

impl TmdsInfo {
    pub fn max_frequency(&self) -> u16 {
        match self {
            TmdsInfo::V1_1(v) => v.max_frequency,
        }
    }

    pub fn settings(&self) -> &[TmdsPllSetting] {
        match self {
            TmdsInfo::V1_1(v) => &v.settings,
        }
    }
}

impl VersionedTable for TmdsInfo {
    const TABLE: DataTableId = DataTableId::TmdsInfo;
    const DECODERS: &'static [Decoder<Self>] = &[Decoder {
        revision: TableRevision::new(1, 1),
        min_len: SETTINGS_AT + SETTING_LEN * TMDS_PLL_SETTING_COUNT,
        decode: decode_v1_1,
    }];
}

fn decode_v1_1(b: &[u8]) -> Option<TmdsInfo> {
    let mut settings = [TmdsPllSetting::default(); TMDS_PLL_SETTING_COUNT];
    for (i, setting) in settings.iter_mut().enumerate() {
        let at = SETTINGS_AT + i * SETTING_LEN;
        *setting = TmdsPllSetting {
            frequency: read_u16_le(b, at)?,
            charge_pump: read_u8(b, at + 2)?,
            duty_cycle: read_u8(b, at + 3)?,
            vco_gain: read_u8(b, at + 4)?,
            voltage_swing: read_u8(b, at + 5)?,
        };
    }
    Some(TmdsInfo::V1_1(TmdsInfoV1_1 {
        max_frequency: read_u16_le(b, 4)?,
        settings,
    }))
}
