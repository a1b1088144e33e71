//! Revision-aware decoding of data tables.
//!
//! A data table's layout depends on the `(format, content)` revision in its common header. Each
//! table type registers one [`Decoder`] per revision it understands; [`TableAccessor`] picks the
//! decoder whose revision matches the header exactly, checks the table is long enough, and only
//! then reads any field. There is no fallback to a nearby revision.

mod firmware_info;
mod tmds_info;
mod vram_usage;

pub use firmware_info::{
    FirmwareCapability, FirmwareInfo, FirmwareInfoCommon, FirmwareInfoV1_2, FirmwareInfoV1_3,
    FirmwareInfoV1_4,
};
pub use tmds_info::{TmdsInfo, TmdsInfoV1_1, TmdsPllSetting, TMDS_PLL_SETTING_COUNT};
pub use vram_usage::{VramReservation, VramUsage};

use core::fmt;
use std::sync::OnceLock;

use crate::error::{AccessError, RegistryError};
use crate::ids::DataTableId;
use crate::rom::{TableEntry, TableIndex, TableRevision};

/// Layout for one revision of a table.
pub struct Decoder<T> {
    pub revision: TableRevision,
    /// Bytes the table must span, common header included, before `decode` runs.
    pub min_len: usize,
    /// Decodes the whole table (header included). Returns `None` only if a read leaves the slice.
    pub decode: fn(&[u8]) -> Option<T>,
}

impl<T> fmt::Debug for Decoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("revision", &self.revision)
            .field("min_len", &self.min_len)
            .finish()
    }
}

/// A data table decoded through a static per-revision registry.
pub trait VersionedTable: Sized + 'static {
    /// Master data table slot the table lives in.
    const TABLE: DataTableId;
    /// Supported revisions.
    const DECODERS: &'static [Decoder<Self>];
}

/// Checks a registry for duplicate revisions and for gaps in the content revisions of a format.
pub fn check_registry<T: VersionedTable>() -> Result<(), RegistryError> {
    let decoders = T::DECODERS;
    for (i, decoder) in decoders.iter().enumerate() {
        if decoders[..i].iter().any(|d| d.revision == decoder.revision) {
            return Err(RegistryError::DuplicateRevision {
                table: T::TABLE,
                revision: decoder.revision,
            });
        }
    }

    // A revision with a lower content revision in its format needs its direct predecessor.
    let registered = |format: u8, content: u8| {
        decoders
            .iter()
            .any(|d| d.revision == TableRevision::new(format, content))
    };
    let gap = decoders
        .iter()
        .map(|d| d.revision)
        .filter(|rev| {
            let has_lower = decoders
                .iter()
                .any(|d| d.revision.format == rev.format && d.revision.content < rev.content);
            has_lower && !registered(rev.format, rev.content - 1)
        })
        .min();
    match gap {
        Some(rev) => Err(RegistryError::RevisionGap {
            table: T::TABLE,
            format: rev.format,
            content: rev.content,
        }),
        None => Ok(()),
    }
}

/// Checks every registry this crate ships.
pub fn check_registries() -> Result<(), RegistryError> {
    check_registry::<FirmwareInfo>()?;
    check_registry::<VramUsage>()?;
    check_registry::<TmdsInfo>()?;
    Ok(())
}

/// [`check_registries`], run once per process.
fn shipped_registries() -> Result<(), RegistryError> {
    static SHIPPED: OnceLock<Result<(), RegistryError>> = OnceLock::new();
    SHIPPED.get_or_init(check_registries).clone()
}

/// A semantic value readable from a data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FirmwareRevision,
    DefaultEngineClock,
    DefaultMemoryClock,
    MaxPixelClockPllOutput,
    MinPixelClockPllOutput,
    MaxPixelClockPllInput,
    MinPixelClockPllInput,
    MaxPixelClock,
    ReferenceClock,
    FirmwareCapability,
    FirmwareVramStart,
    FirmwareVramSizeKib,
    TmdsMaxFrequency,
    TmdsFrequency(usize),
    TmdsPllChargePump(usize),
    TmdsPllDutyCycle(usize),
    TmdsPllVcoGain(usize),
    TmdsPllVoltageSwing(usize),
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::FirmwareRevision => "firmware revision",
            Field::DefaultEngineClock => "default engine clock",
            Field::DefaultMemoryClock => "default memory clock",
            Field::MaxPixelClockPllOutput => "maximum pixel clock PLL output",
            Field::MinPixelClockPllOutput => "minimum pixel clock PLL output",
            Field::MaxPixelClockPllInput => "maximum pixel clock PLL input",
            Field::MinPixelClockPllInput => "minimum pixel clock PLL input",
            Field::MaxPixelClock => "maximum pixel clock",
            Field::ReferenceClock => "reference clock",
            Field::FirmwareCapability => "firmware capability",
            Field::FirmwareVramStart => "firmware VRAM scratch start",
            Field::FirmwareVramSizeKib => "firmware VRAM scratch size",
            Field::TmdsMaxFrequency => "TMDS maximum frequency",
            Field::TmdsFrequency(_) => "TMDS frequency",
            Field::TmdsPllChargePump(_) => "TMDS PLL charge pump",
            Field::TmdsPllDutyCycle(_) => "TMDS PLL duty cycle",
            Field::TmdsPllVcoGain(_) => "TMDS PLL VCO gain",
            Field::TmdsPllVoltageSwing(_) => "TMDS PLL voltage swing",
        }
    }

    /// Data table the field is read from.
    pub fn table(self) -> DataTableId {
        match self {
            Field::FirmwareRevision
            | Field::DefaultEngineClock
            | Field::DefaultMemoryClock
            | Field::MaxPixelClockPllOutput
            | Field::MinPixelClockPllOutput
            | Field::MaxPixelClockPllInput
            | Field::MinPixelClockPllInput
            | Field::MaxPixelClock
            | Field::ReferenceClock
            | Field::FirmwareCapability => DataTableId::FirmwareInfo,
            Field::FirmwareVramStart | Field::FirmwareVramSizeKib => {
                DataTableId::VramUsageByFirmware
            }
            Field::TmdsMaxFrequency
            | Field::TmdsFrequency(_)
            | Field::TmdsPllChargePump(_)
            | Field::TmdsPllDutyCycle(_)
            | Field::TmdsPllVcoGain(_)
            | Field::TmdsPllVoltageSwing(_) => DataTableId::TmdsInfo,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only view over the data tables of a located image.
#[derive(Debug, Clone, Copy)]
pub struct TableAccessor<'a> {
    image: &'a [u8],
    index: &'a TableIndex,
}

impl<'a> TableAccessor<'a> {
    pub fn new(image: &'a [u8], index: &'a TableIndex) -> Result<Self, RegistryError> {
        shipped_registries()?;
        Ok(Self { image, index })
    }

    pub fn entry(&self, table: DataTableId) -> TableEntry {
        self.index.data_table(table)
    }

    /// Revision and raw bytes (header included) of a present, non-empty table.
    pub fn table_bytes(
        &self,
        table: DataTableId,
    ) -> Result<(TableRevision, &'a [u8]), AccessError> {
        let entry = self.entry(table);
        if !entry.present || entry.size == 0 {
            return Err(AccessError::TableAbsent { table });
        }
        let bytes = entry
            .range()
            .and_then(|range| self.image.get(range))
            .ok_or(AccessError::TableAbsent { table })?;
        Ok((entry.revision, bytes))
    }

    /// Decodes `T` with the layout registered for the table's exact revision.
    pub fn decode<T: VersionedTable>(&self) -> Result<T, AccessError> {
        check_registry::<T>()?;
        self.decode_checked()
    }

    /// [`Self::decode`] for a registry that has already been checked.
    fn decode_checked<T: VersionedTable>(&self) -> Result<T, AccessError> {
        let (revision, bytes) = self.table_bytes(T::TABLE)?;
        let decoder = T::DECODERS
            .iter()
            .find(|d| d.revision == revision)
            .ok_or(AccessError::UnsupportedRevision {
                table: T::TABLE,
                revision,
            })?;

        let truncated = AccessError::Truncated {
            table: T::TABLE,
            revision,
            needed: decoder.min_len,
            available: bytes.len(),
        };
        if bytes.len() < decoder.min_len {
            return Err(truncated);
        }
        (decoder.decode)(bytes).ok_or(truncated)
    }

    // Shipped registries were checked in `new`.

    pub fn firmware_info(&self) -> Result<FirmwareInfo, AccessError> {
        self.decode_checked()
    }

    pub fn vram_usage(&self) -> Result<VramUsage, AccessError> {
        self.decode_checked()
    }

    pub fn tmds_info(&self) -> Result<TmdsInfo, AccessError> {
        self.decode_checked()
    }

    fn tmds_setting(&self, field: Field, index: usize) -> Result<TmdsPllSetting, AccessError> {
        let info = self.tmds_info()?;
        let settings = info.settings();
        settings
            .get(index)
            .copied()
            .ok_or(AccessError::IndexOutOfRange {
                field: field.name(),
                index,
                count: settings.len(),
            })
    }

    pub fn read_field(&self, field: Field) -> Result<u32, AccessError> {
        let value = match field {
            Field::FirmwareRevision => self.firmware_info()?.common().firmware_revision,
            Field::DefaultEngineClock => self.firmware_info()?.common().default_engine_clock,
            Field::DefaultMemoryClock => self.firmware_info()?.common().default_memory_clock,
            Field::MaxPixelClockPllOutput => self.firmware_info()?.common().max_pixel_pll_output,
            Field::MinPixelClockPllOutput => self.firmware_info()?.min_pixel_pll_output(),
            Field::MaxPixelClockPllInput => {
                u32::from(self.firmware_info()?.common().max_pixel_pll_input)
            }
            Field::MinPixelClockPllInput => {
                u32::from(self.firmware_info()?.common().min_pixel_pll_input)
            }
            Field::MaxPixelClock => u32::from(self.firmware_info()?.common().max_pixel_clock),
            Field::ReferenceClock => u32::from(self.firmware_info()?.common().reference_clock),
            Field::FirmwareCapability => {
                u32::from(self.firmware_info()?.common().capability.bits())
            }
            Field::FirmwareVramStart => self.vram_usage()?.reservation().start_address,
            Field::FirmwareVramSizeKib => u32::from(self.vram_usage()?.reservation().size_kib),
            Field::TmdsMaxFrequency => u32::from(self.tmds_info()?.max_frequency()),
            Field::TmdsFrequency(i) => u32::from(self.tmds_setting(field, i)?.frequency),
            Field::TmdsPllChargePump(i) => u32::from(self.tmds_setting(field, i)?.charge_pump),
            Field::TmdsPllDutyCycle(i) => u32::from(self.tmds_setting(field, i)?.duty_cycle),
            Field::TmdsPllVcoGain(i) => u32::from(self.tmds_setting(field, i)?.vco_gain),
            Field::TmdsPllVoltageSwing(i) => {
                u32::from(self.tmds_setting(field, i)?.voltage_swing)
            }
        };
        tracing::trace!(field = field.name(), value, "read data table field");
        Ok(value)
    }
}
