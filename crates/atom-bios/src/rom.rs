//! ROM header and master table discovery.
//!
//! An AtomBIOS image stores a 16-bit pointer to its ROM header at a fixed offset. The ROM header
//! points at two master tables (data and command), each of which is a common table header
//! followed by a flat list of 16-bit sub-table offsets. [`locate`] walks all of it once and
//! produces a [`TableIndex`] describing every sub-table that is actually present.
//!
//! The image is treated as untrusted: every offset is bounds checked and malformed sub-tables are
//! recorded as absent rather than failing the whole image.

use core::fmt;

use crate::bytes::{read_array, read_cstr, read_u16_le, read_u8};
use crate::config::AtomBiosConfig;
use crate::error::LocateError;
use crate::ids::{CommandId, DataTableId};

/// Signature stored 4 bytes into the ROM header.
pub const ROM_SIGNATURE: [u8; 4] = *b"ATOM";

/// `structure_size` value marking an unused table.
pub const PLACEHOLDER_SIZE: u16 = 0xAA55;

/// Length of the common header in front of every table.
pub const COMMON_HEADER_LEN: usize = 4;

// Common header + signature + 13 u16 fields + extended function code.
const ROM_HEADER_LEN: usize = 35;
const MAX_STRING_LEN: usize = 256;

/// `(format, content)` revision pair from a table's common header.
///
/// Orders by format revision first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRevision {
    pub format: u8,
    pub content: u8,
}

impl TableRevision {
    pub const fn new(format: u8, content: u8) -> Self {
        Self { format, content }
    }
}

impl fmt::Display for TableRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.format, self.content)
    }
}

/// The 4-byte header shared by every AtomBIOS table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHeader {
    /// Total table size in bytes, header included.
    pub structure_size: u16,
    pub revision: TableRevision,
}

impl TableHeader {
    pub fn parse(bytes: &[u8], offset: usize) -> Option<Self> {
        Some(Self {
            structure_size: read_u16_le(bytes, offset)?,
            revision: TableRevision {
                format: read_u8(bytes, offset.checked_add(2)?)?,
                content: read_u8(bytes, offset.checked_add(3)?)?,
            },
        })
    }

    pub fn is_placeholder(&self) -> bool {
        self.structure_size == PLACEHOLDER_SIZE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterTable {
    Data,
    Command,
}

impl fmt::Display for MasterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MasterTable::Data => "data",
            MasterTable::Command => "command",
        })
    }
}

/// Decoded ATOM ROM header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomHeader {
    /// Image offset of the header.
    pub offset: usize,
    pub header: TableHeader,
    pub bios_runtime_segment: u16,
    pub protected_mode_info_offset: u16,
    pub config_filename_offset: u16,
    pub crc_block_offset: u16,
    pub bootup_message_offset: u16,
    pub int10_offset: u16,
    pub pci_bus_dev_init_code: u16,
    pub io_base_address: u16,
    pub subsystem_vendor_id: u16,
    pub subsystem_id: u16,
    pub pci_info_offset: u16,
    pub master_command_table_offset: u16,
    pub master_data_table_offset: u16,
    pub extended_function_code: u8,
}

impl RomHeader {
    fn parse(image: &[u8], offset: usize) -> Result<Self, LocateError> {
        let end = offset.checked_add(ROM_HEADER_LEN);
        if end.map_or(true, |end| end > image.len()) {
            return Err(truncated("ROM header", offset, ROM_HEADER_LEN, image));
        }

        let signature_at = offset + COMMON_HEADER_LEN;
        let found: [u8; 4] = read_array(image, signature_at)
            .ok_or_else(|| truncated("ROM header", offset, ROM_HEADER_LEN, image))?;
        if found != ROM_SIGNATURE {
            return Err(LocateError::BadSignature {
                offset: signature_at,
                found,
            });
        }

        let header = TableHeader::parse(image, offset)
            .ok_or_else(|| truncated("ROM header", offset, ROM_HEADER_LEN, image))?;
        if header.is_placeholder() {
            return Err(LocateError::MalformedRomHeader {
                offset,
                reason: "placeholder sentinel in place of the ROM header",
            });
        }
        let structure_size = usize::from(header.structure_size);
        if structure_size < ROM_HEADER_LEN {
            return Err(LocateError::MalformedRomHeader {
                offset,
                reason: "structure size smaller than the ROM header fields",
            });
        }
        if offset + structure_size > image.len() {
            return Err(truncated("ROM header", offset, structure_size, image));
        }

        // Length was checked above, so none of these reads can fail.
        let field = |rel: usize| read_u16_le(image, offset + rel).unwrap_or(0);
        Ok(Self {
            offset,
            header,
            bios_runtime_segment: field(8),
            protected_mode_info_offset: field(10),
            config_filename_offset: field(12),
            crc_block_offset: field(14),
            bootup_message_offset: field(16),
            int10_offset: field(18),
            pci_bus_dev_init_code: field(20),
            io_base_address: field(22),
            subsystem_vendor_id: field(24),
            subsystem_id: field(26),
            pci_info_offset: field(28),
            master_command_table_offset: field(30),
            master_data_table_offset: field(32),
            extended_function_code: read_u8(image, offset + 34).unwrap_or(0),
        })
    }

    /// NUL-terminated configuration file name, if the header points at one.
    pub fn config_filename<'a>(&self, image: &'a [u8]) -> Option<&'a str> {
        image_str(image, self.config_filename_offset)
    }

    /// NUL-terminated boot-up banner, if the header points at one.
    pub fn bootup_message<'a>(&self, image: &'a [u8]) -> Option<&'a str> {
        image_str(image, self.bootup_message_offset)
    }
}

fn image_str(image: &[u8], offset: u16) -> Option<&str> {
    if offset == 0 {
        return None;
    }
    let bytes = read_cstr(image, usize::from(offset), MAX_STRING_LEN)?;
    core::str::from_utf8(bytes).ok()
}

/// Location of one sub-table inside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableEntry {
    /// Image offset of the table's common header.
    pub offset: usize,
    /// Body size in bytes (`structure_size` minus the common header).
    pub size: usize,
    pub revision: TableRevision,
    pub present: bool,
}

impl TableEntry {
    pub const ABSENT: TableEntry = TableEntry {
        offset: 0,
        size: 0,
        revision: TableRevision::new(0, 0),
        present: false,
    };

    /// Byte range of the whole table, header included. `None` for absent entries.
    pub fn range(&self) -> Option<core::ops::Range<usize>> {
        self.present
            .then(|| self.offset..self.offset + COMMON_HEADER_LEN + self.size)
    }
}

/// Every sub-table the master tables reference, keyed by slot ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableIndex {
    rom_header: RomHeader,
    data: Vec<TableEntry>,
    commands: Vec<TableEntry>,
}

impl TableIndex {
    pub fn rom_header(&self) -> &RomHeader {
        &self.rom_header
    }

    pub fn data_table(&self, id: DataTableId) -> TableEntry {
        self.data_entry(id.index())
    }

    pub fn command_table(&self, id: CommandId) -> TableEntry {
        self.command_entry(id.index())
    }

    /// Entry for a raw data-table ordinal. Ordinals past the end of the list are absent.
    pub fn data_entry(&self, ordinal: usize) -> TableEntry {
        self.data.get(ordinal).copied().unwrap_or(TableEntry::ABSENT)
    }

    /// Entry for a raw command-table ordinal. Ordinals past the end of the list are absent.
    pub fn command_entry(&self, ordinal: usize) -> TableEntry {
        self.commands
            .get(ordinal)
            .copied()
            .unwrap_or(TableEntry::ABSENT)
    }

    /// Number of slots the master data table lists.
    pub fn data_slot_count(&self) -> usize {
        self.data.len()
    }

    /// Number of slots the master command table lists.
    pub fn command_slot_count(&self) -> usize {
        self.commands.len()
    }
}

/// Locates the ROM header and both master tables using the default configuration.
pub fn locate(image: &[u8]) -> Result<TableIndex, LocateError> {
    locate_with(image, &AtomBiosConfig::default())
}

pub fn locate_with(image: &[u8], config: &AtomBiosConfig) -> Result<TableIndex, LocateError> {
    let pointer_at = config.rom_header_pointer;
    let rom_offset = read_u16_le(image, pointer_at)
        .ok_or_else(|| truncated("ROM header pointer", pointer_at, 2, image))?;
    let rom_header = RomHeader::parse(image, usize::from(rom_offset))?;

    tracing::debug!(
        offset = rom_header.offset,
        revision = %rom_header.header.revision,
        subsystem_vendor = rom_header.subsystem_vendor_id,
        subsystem = rom_header.subsystem_id,
        io_base = rom_header.io_base_address,
        config_filename = rom_header.config_filename(image).unwrap_or(""),
        bootup_message = rom_header.bootup_message(image).unwrap_or(""),
        "found ATOM ROM header"
    );

    let data = walk_master(
        image,
        MasterTable::Data,
        usize::from(rom_header.master_data_table_offset),
    )?;
    let commands = walk_master(
        image,
        MasterTable::Command,
        usize::from(rom_header.master_command_table_offset),
    )?;

    Ok(TableIndex {
        rom_header,
        data,
        commands,
    })
}

fn walk_master(
    image: &[u8],
    which: MasterTable,
    offset: usize,
) -> Result<Vec<TableEntry>, LocateError> {
    let what = match which {
        MasterTable::Data => "master data table",
        MasterTable::Command => "master command table",
    };
    let header = TableHeader::parse(image, offset)
        .ok_or_else(|| truncated(what, offset, COMMON_HEADER_LEN, image))?;
    if header.is_placeholder() {
        return Err(LocateError::MalformedMasterTable {
            which,
            offset,
            reason: "placeholder sentinel in place of a master table",
        });
    }
    let structure_size = usize::from(header.structure_size);
    if structure_size < COMMON_HEADER_LEN {
        return Err(LocateError::MalformedMasterTable {
            which,
            offset,
            reason: "structure size smaller than the common header",
        });
    }
    if offset + structure_size > image.len() {
        return Err(truncated(what, offset, structure_size, image));
    }

    let count = (structure_size - COMMON_HEADER_LEN) / 2;
    let mut entries = Vec::with_capacity(count);
    for slot in 0..count {
        let sub_offset = read_u16_le(image, offset + COMMON_HEADER_LEN + slot * 2).unwrap_or(0);
        entries.push(sub_table_entry(image, which, slot, usize::from(sub_offset)));
    }

    tracing::debug!(
        table = %which,
        offset,
        revision = %header.revision,
        slots = count,
        present = entries.iter().filter(|e| e.present).count(),
        "walked master table"
    );
    Ok(entries)
}

fn sub_table_entry(image: &[u8], which: MasterTable, slot: usize, offset: usize) -> TableEntry {
    if offset == 0 {
        return TableEntry::ABSENT;
    }

    let reason = match TableHeader::parse(image, offset) {
        None => "header outside the image",
        Some(header) if header.is_placeholder() => "placeholder sentinel",
        Some(header) if usize::from(header.structure_size) < COMMON_HEADER_LEN => {
            "structure size smaller than the common header"
        }
        Some(header) if offset + usize::from(header.structure_size) > image.len() => {
            "body extends past the end of the image"
        }
        Some(header) => {
            tracing::trace!(
                table = %which,
                slot,
                offset,
                size = header.structure_size,
                revision = %header.revision,
                "sub-table present"
            );
            return TableEntry {
                offset,
                size: usize::from(header.structure_size) - COMMON_HEADER_LEN,
                revision: header.revision,
                present: true,
            };
        }
    };

    tracing::warn!(
        table = %which,
        slot,
        name = slot_name(which, slot),
        offset,
        reason,
        "marking sub-table absent"
    );
    TableEntry::ABSENT
}

fn slot_name(which: MasterTable, slot: usize) -> &'static str {
    match which {
        MasterTable::Data => DataTableId::from_index(slot).map(DataTableId::name),
        MasterTable::Command => CommandId::from_index(slot).map(CommandId::name),
    }
    .unwrap_or("<unnamed>")
}

fn truncated(what: &'static str, offset: usize, len: usize, image: &[u8]) -> LocateError {
    LocateError::Truncated {
        what,
        offset,
        len,
        image_len: image.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_displays_format_then_content() {
        assert_eq!(TableRevision::new(1, 4).to_string(), "1.4");
        assert!(TableRevision::new(1, 4) < TableRevision::new(2, 1));
    }

    #[test]
    fn header_parse_is_bounds_checked() {
        let bytes = [0x10, 0x00, 0x01, 0x03];
        let header = TableHeader::parse(&bytes, 0).unwrap();
        assert_eq!(header.structure_size, 0x10);
        assert_eq!(header.revision, TableRevision::new(1, 3));
        assert_eq!(TableHeader::parse(&bytes, 1), None);
    }

    #[test]
    fn placeholder_is_detected() {
        let bytes = [0x55, 0xAA, 0x01, 0x01];
        assert!(TableHeader::parse(&bytes, 0).unwrap().is_placeholder());
    }

    #[test]
    fn absent_entry_has_no_range() {
        assert_eq!(TableEntry::ABSENT.range(), None);
        let entry = TableEntry {
            offset: 0x100,
            size: 8,
            revision: TableRevision::new(1, 1),
            present: true,
        };
        assert_eq!(entry.range(), Some(0x100..0x10C));
    }

    #[test]
    fn tiny_images_are_truncated() {
        assert!(matches!(
            locate(&[0u8; 0x49]),
            Err(LocateError::Truncated {
                what: "ROM header pointer",
                ..
            })
        ));
    }
}
