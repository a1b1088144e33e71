//! Shared helpers for `atom-bios` integration tests.
//!
//! [`ImageBuilder`] lays out a minimal firmware image: ROM header pointer at `0x48`, ROM header at
//! `0x80`, master data table at `0x100`, master command table at `0x180`, sub-tables from `0x240`.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use atom_bios::{
    CailCallbacks, CommandId, CommandProgram, DataTableId, HardwareAccess, Interpreter,
    InterpreterError, PciWidth, TableRevision,
};

pub const ROM_HEADER_AT: usize = 0x80;
pub const MASTER_DATA_AT: usize = 0x100;
pub const MASTER_COMMAND_AT: usize = 0x180;
pub const SUB_TABLES_AT: usize = 0x240;
const CONFIG_FILENAME_AT: usize = 0xC0;
const BOOTUP_MESSAGE_AT: usize = 0xD0;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

#[derive(Debug, Clone)]
struct RawTable {
    structure_size: u16,
    format: u8,
    content: u8,
    body: Vec<u8>,
}

#[derive(Debug, Clone)]
enum Slot {
    Table(RawTable),
    /// Raw offset written straight into the master list.
    Offset(u16),
}

#[derive(Debug, Clone)]
pub struct ImageBuilder {
    signature: [u8; 4],
    data_slots: usize,
    command_slots: usize,
    data: HashMap<usize, Slot>,
    commands: HashMap<usize, Slot>,
    master_data_size: Option<u16>,
    master_command_size: Option<u16>,
    rom_header_size: u16,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self {
            signature: *b"ATOM",
            data_slots: DataTableId::ALL.len(),
            command_slots: CommandId::ALL.len(),
            data: HashMap::new(),
            commands: HashMap::new(),
            master_data_size: None,
            master_command_size: None,
            rom_header_size: 36,
        }
    }

    pub fn signature(mut self, signature: [u8; 4]) -> Self {
        self.signature = signature;
        self
    }

    /// Shortens the master data list to `slots` entries.
    pub fn data_slots(mut self, slots: usize) -> Self {
        self.data_slots = slots;
        self
    }

    /// Overrides the `structure_size` the ROM header declares.
    pub fn rom_header_size(mut self, size: u16) -> Self {
        self.rom_header_size = size;
        self
    }

    pub fn master_data_size(mut self, size: u16) -> Self {
        self.master_data_size = Some(size);
        self
    }

    pub fn master_command_size(mut self, size: u16) -> Self {
        self.master_command_size = Some(size);
        self
    }

    /// Adds a data table; `body` excludes the common header.
    pub fn data_table(self, id: DataTableId, format: u8, content: u8, body: Vec<u8>) -> Self {
        let size = (body.len() + 4) as u16;
        self.raw_data_table(id, size, format, content, body)
    }

    /// Adds a data table whose header declares `structure_size` regardless of `body`.
    pub fn raw_data_table(
        mut self,
        id: DataTableId,
        structure_size: u16,
        format: u8,
        content: u8,
        body: Vec<u8>,
    ) -> Self {
        self.data.insert(
            id.index(),
            Slot::Table(RawTable {
                structure_size,
                format,
                content,
                body,
            }),
        );
        self
    }

    pub fn data_offset(mut self, id: DataTableId, offset: u16) -> Self {
        self.data.insert(id.index(), Slot::Offset(offset));
        self
    }

    /// Adds a command table; `body` starts with the two attribute bytes.
    pub fn command_table(mut self, id: CommandId, format: u8, content: u8, body: Vec<u8>) -> Self {
        self.commands.insert(
            id.index(),
            Slot::Table(RawTable {
                structure_size: (body.len() + 4) as u16,
                format,
                content,
                body,
            }),
        );
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut image = vec![0u8; SUB_TABLES_AT];
        image[0] = 0x55;
        image[1] = 0xAA;
        put_u16(&mut image, 0x48, ROM_HEADER_AT as u16);

        // ROM header.
        put_u16(&mut image, ROM_HEADER_AT, self.rom_header_size);
        image[ROM_HEADER_AT + 2] = 1;
        image[ROM_HEADER_AT + 3] = 1;
        image[ROM_HEADER_AT + 4..ROM_HEADER_AT + 8].copy_from_slice(&self.signature);
        put_u16(&mut image, ROM_HEADER_AT + 12, CONFIG_FILENAME_AT as u16);
        put_u16(&mut image, ROM_HEADER_AT + 16, BOOTUP_MESSAGE_AT as u16);
        put_u16(&mut image, ROM_HEADER_AT + 22, 0x9000);
        put_u16(&mut image, ROM_HEADER_AT + 24, 0x1002);
        put_u16(&mut image, ROM_HEADER_AT + 26, 0x7149);
        put_u16(&mut image, ROM_HEADER_AT + 30, MASTER_COMMAND_AT as u16);
        put_u16(&mut image, ROM_HEADER_AT + 32, MASTER_DATA_AT as u16);
        image[CONFIG_FILENAME_AT..CONFIG_FILENAME_AT + 7].copy_from_slice(b"M56.CFG");
        image[BOOTUP_MESSAGE_AT..BOOTUP_MESSAGE_AT + 9].copy_from_slice(b"ATOMBIOS\n");

        let data_offsets = place(&mut image, self.data_slots, &self.data);
        let command_offsets = place(&mut image, self.command_slots, &self.commands);

        write_master(
            &mut image,
            MASTER_DATA_AT,
            self.master_data_size
                .unwrap_or((4 + 2 * self.data_slots) as u16),
            &data_offsets,
        );
        write_master(
            &mut image,
            MASTER_COMMAND_AT,
            self.master_command_size
                .unwrap_or((4 + 2 * self.command_slots) as u16),
            &command_offsets,
        );

        image.resize(image.len() + 16, 0);
        image
    }
}

fn place(image: &mut Vec<u8>, slots: usize, tables: &HashMap<usize, Slot>) -> Vec<u16> {
    (0..slots)
        .map(|slot| match tables.get(&slot) {
            None => 0,
            Some(Slot::Offset(offset)) => *offset,
            Some(Slot::Table(table)) => {
                let at = image.len();
                image.extend_from_slice(&table.structure_size.to_le_bytes());
                image.push(table.format);
                image.push(table.content);
                image.extend_from_slice(&table.body);
                at as u16
            }
        })
        .collect()
}

fn write_master(image: &mut [u8], at: usize, size: u16, offsets: &[u16]) {
    put_u16(image, at, size);
    image[at + 2] = 1;
    image[at + 3] = 1;
    for (i, offset) in offsets.iter().enumerate() {
        put_u16(image, at + 4 + i * 2, *offset);
    }
}

pub fn put_u16(bytes: &mut [u8], at: usize, value: u16) {
    bytes[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

pub fn put_u32(bytes: &mut [u8], at: usize, value: u32) {
    bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

pub const DEFAULT_ENGINE_CLOCK: u32 = 50_000;
pub const DEFAULT_MEMORY_CLOCK: u32 = 40_000;

/// FirmwareInfo body (no common header) for a Radeon with a 27 MHz crystal.
///
/// Offsets below are table offsets; the body starts 4 bytes in.
pub fn firmware_info_body() -> Vec<u8> {
    let mut table = vec![0u8; 89];
    put_u32(&mut table, 4, 0x0001_0203);
    put_u32(&mut table, 8, DEFAULT_ENGINE_CLOCK);
    put_u32(&mut table, 12, DEFAULT_MEMORY_CLOCK);
    put_u32(&mut table, 32, 110_000);
    table[45] = 0x20;
    put_u16(&mut table, 46, 1200);
    put_u32(&mut table, 52, 45_000);
    put_u16(&mut table, 72, 40_000);
    put_u16(&mut table, 74, 100);
    put_u16(&mut table, 76, 1350);
    put_u16(&mut table, 78, 64_800);
    put_u16(&mut table, 80, 0x0003);
    put_u16(&mut table, 82, 2700);
    table.split_off(4)
}

/// Writes `value` at table offset `at` of a body produced by [`firmware_info_body`].
pub fn set_table_u32(body: &mut [u8], at: usize, value: u32) {
    put_u32(body, at - 4, value);
}

pub fn set_table_u16(body: &mut [u8], at: usize, value: u16) {
    put_u16(body, at - 4, value);
}

pub fn vram_usage_body(start: u32, size_kib: u16) -> Vec<u8> {
    let mut body = vec![0u8; 8];
    put_u32(&mut body, 0, start);
    put_u16(&mut body, 4, size_kib);
    body
}

pub fn tmds_info_body() -> Vec<u8> {
    let mut body = vec![0u8; 26];
    put_u16(&mut body, 0, 16_500);
    for i in 0..4 {
        let at = 2 + i * 6;
        put_u16(&mut body, at, 4_000 * (i as u16 + 1));
        body[at + 2] = 0x10 + i as u8;
        body[at + 3] = 0x20 + i as u8;
        body[at + 4] = 0x30 + i as u8;
        body[at + 5] = 0x40 + i as u8;
    }
    body
}

/// Command table body: workspace size, parameter space size, byte code.
pub fn command_body(work_space: u8, param_space: u8, code: &[u8]) -> Vec<u8> {
    let mut body = vec![work_space, param_space];
    body.extend_from_slice(code);
    body
}

/// The image most tests start from.
pub fn standard_image() -> ImageBuilder {
    ImageBuilder::new()
        .data_table(DataTableId::FirmwareInfo, 1, 4, firmware_info_body())
        .command_table(CommandId::AsicInit, 1, 1, command_body(0, 16, &[0x5B]))
        .command_table(
            CommandId::SetPixelClock,
            1,
            2,
            command_body(4, 20, &[0x01, 0x02, 0x5B]),
        )
        .command_table(CommandId::EnableCrtc, 1, 1, command_body(0, 4, &[0x5B]))
}

/// Hardware double that records every access.
#[derive(Debug, Clone)]
pub struct RecordingHardware {
    pub registers: HashMap<u32, u32>,
    pub mmio_reads: Vec<u32>,
    pub mmio_writes: Vec<(u32, u32)>,
    pub pci_reads: Vec<(u32, PciWidth)>,
    pub pci_writes: Vec<(u32, PciWidth, u32)>,
    pub pll: Vec<(u32, Option<u32>)>,
    pub mc: Vec<(u32, Option<u32>)>,
    pub vram: Vec<u8>,
    pub vram_accesses: usize,
    pub delays: Vec<u32>,
    pub framebuffer_mapped: bool,
}

impl RecordingHardware {
    pub fn new(vram_len: usize) -> Self {
        Self {
            registers: HashMap::new(),
            mmio_reads: Vec::new(),
            mmio_writes: Vec::new(),
            pci_reads: Vec::new(),
            pci_writes: Vec::new(),
            pll: Vec::new(),
            mc: Vec::new(),
            vram: vec![0; vram_len],
            vram_accesses: 0,
            delays: Vec::new(),
            framebuffer_mapped: true,
        }
    }

    pub fn total_calls(&self) -> usize {
        self.mmio_reads.len()
            + self.mmio_writes.len()
            + self.pci_reads.len()
            + self.pci_writes.len()
            + self.pll.len()
            + self.mc.len()
            + self.vram_accesses
            + self.delays.len()
    }
}

impl HardwareAccess for RecordingHardware {
    fn mmio_read_u32(&mut self, offset: u32) -> u32 {
        self.mmio_reads.push(offset);
        self.registers.get(&offset).copied().unwrap_or(0)
    }

    fn mmio_write_u32(&mut self, offset: u32, value: u32) {
        self.mmio_writes.push((offset, value));
        self.registers.insert(offset, value);
    }

    fn pci_config_read(&mut self, offset: u32, width: PciWidth) -> u32 {
        self.pci_reads.push((offset, width));
        0x1002_7149
    }

    fn pci_config_write(&mut self, offset: u32, width: PciWidth, value: u32) {
        self.pci_writes.push((offset, width, value));
    }

    fn pll_read(&mut self, index: u32) -> u32 {
        self.pll.push((index, None));
        0
    }

    fn pll_write(&mut self, index: u32, value: u32) {
        self.pll.push((index, Some(value)));
    }

    fn mc_read(&mut self, index: u32) -> u32 {
        self.mc.push((index, None));
        0
    }

    fn mc_write(&mut self, index: u32, value: u32) {
        self.mc.push((index, Some(value)));
    }

    fn vram_read_u8(&mut self, addr: u64) -> u8 {
        self.vram_accesses += 1;
        self.vram[addr as usize]
    }

    fn vram_write_u8(&mut self, addr: u64, value: u8) {
        self.vram_accesses += 1;
        self.vram[addr as usize] = value;
    }

    fn framebuffer_mapped(&self) -> bool {
        self.framebuffer_mapped
    }

    fn delay_us(&mut self, micros: u32) {
        self.delays.push(micros);
    }
}

/// What the interpreter saw on one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub command: CommandId,
    pub revision: TableRevision,
    pub params: Vec<u8>,
    pub code: Vec<u8>,
    pub work_space: u8,
    pub param_space: u8,
}

type Script = Box<dyn FnMut(&mut [u8], &mut dyn CailCallbacks) -> Result<(), InterpreterError>>;

/// Interpreter double that records each run and then executes a test script.
pub struct ScriptedInterpreter {
    script: Script,
    runs: Rc<RefCell<Vec<RunRecord>>>,
}

impl ScriptedInterpreter {
    pub fn new<F>(script: F) -> Self
    where
        F: FnMut(&mut [u8], &mut dyn CailCallbacks) -> Result<(), InterpreterError> + 'static,
    {
        Self {
            script: Box::new(script),
            runs: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Runs nothing and touches no callback.
    pub fn noop() -> Self {
        Self::new(|_, _| Ok(()))
    }

    pub fn failing(message: &'static str) -> Self {
        Self::new(move |_, _| Err(InterpreterError::from(message)))
    }

    /// Shared handle to the run log, usable after the interpreter moves into a session.
    pub fn runs(&self) -> Rc<RefCell<Vec<RunRecord>>> {
        Rc::clone(&self.runs)
    }
}

impl Interpreter for ScriptedInterpreter {
    fn run(
        &mut self,
        program: &CommandProgram<'_>,
        params: &mut [u8],
        callbacks: &mut dyn CailCallbacks,
    ) -> Result<(), InterpreterError> {
        self.runs.borrow_mut().push(RunRecord {
            command: program.command(),
            revision: program.revision(),
            params: params.to_vec(),
            code: program.code().to_vec(),
            work_space: program.work_space_size(),
            param_space: program.parameter_space_size(),
        });
        (self.script)(params, callbacks)
    }
}
