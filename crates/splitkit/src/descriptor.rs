//! Binary layout detection for an attached process.
//!
//! The host runtime does not tell an auto splitter whether its target is a
//! 32-bit or 64-bit process, so we parse the executable header out of the
//! remote process's own memory to work it out. Going through memory rather
//! than the filesystem also sidesteps compatibility layers whose reported
//! executable path points at the layer instead of the game.
//!
//! Detection is best-effort: an unrecognized header is logged and the
//! descriptor keeps its 64-bit little-endian defaults, so callers can still
//! proceed at reduced reliability.

use strum::Display;
use tracing::{debug, warn};

use crate::error::Result;
use crate::memory::{Address, ByteOrder, MemValue, PointerWidth, RemoteProcess};

// DOS header: "MZ" magic at 0, e_lfanew at 0x3C. The NT header it points to
// starts with "PE\0\0" followed by the 16-bit machine field; SizeOfImage
// sits at 0x50 from the NT header start. All PE fields are little-endian on
// disk regardless of the host.
const DOS_MAGIC: [u8; 2] = *b"MZ";
const DOS_HEADER_LEN: usize = 0x3E;
const E_LFANEW_OFFSET: usize = 0x3C;

const NT_SIGNATURE: [u8; 4] = *b"PE\0\0";
const NT_HEADER_LEN: usize = 0x54;
const MACHINE_OFFSET: usize = 0x4;
const SIZE_OF_IMAGE_OFFSET: usize = 0x50;

const IMAGE_FILE_MACHINE_I386: u16 = 0x014C;
const IMAGE_FILE_MACHINE_AMD64: u16 = 0x8664;

const ELF_MAGIC: [u8; 4] = *b"\x7FELF";
const ELF_IDENT_LEN: usize = 6;
const ELFCLASS32: u8 = 1;
const ELFCLASS64: u8 = 2;
const ELFDATA2LSB: u8 = 1;
const ELFDATA2MSB: u8 = 2;

/// Some virtualization layers report the main module's size as a single
/// page no matter how large the image actually is.
const UNDERSIZED_MODULE_SIZE: u64 = 0x1000;

/// Executable format recognized in the target's main module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BinaryFormat {
    #[strum(serialize = "PE")]
    Pe,
    #[strum(serialize = "ELF")]
    Elf,
    #[strum(serialize = "unknown")]
    Unknown,
}

/// Options for [`ProcessDescriptor::detect`].
#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// Module to parse the header of. Defaults to the basename of the
    /// process's executable path.
    pub module: Option<String>,
    /// Replace a main-module size reported as exactly one page with the PE
    /// header's declared image size.
    pub fix_undersized_module: bool,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            module: None,
            fix_undersized_module: true,
        }
    }
}

/// Resolved layout of an attached process: main module bounds, executable
/// format, pointer width, and byte order.
///
/// Built once at attach time and immutable afterwards. The descriptor owns
/// the process handle; dropping it is the detach. Width and order default to
/// 64-bit little-endian until detection succeeds, and detection failure is
/// reported through the log, never as an error.
#[derive(Debug)]
pub struct ProcessDescriptor<P: RemoteProcess> {
    process: P,
    module_address: Address,
    module_size: u64,
    executable_path: String,
    format: BinaryFormat,
    pointer_width: PointerWidth,
    byte_order: ByteOrder,
}

impl<P: RemoteProcess> ProcessDescriptor<P> {
    /// Resolve the main module and classify its executable format.
    ///
    /// PE is attempted first since the primary target ecosystem ships PE
    /// binaries, including under compatibility layers on non-native hosts.
    pub fn detect(process: P, options: &DetectOptions) -> Self {
        let executable_path = process.executable_path();
        let module = options
            .module
            .clone()
            .unwrap_or_else(|| module_basename(&executable_path).to_string());

        let module_address = process.module_address(&module);
        let module_size = process.module_size(&module);

        let mut descriptor = Self {
            process,
            module_address,
            module_size,
            executable_path,
            format: BinaryFormat::Unknown,
            pointer_width: PointerWidth::Bits64,
            byte_order: ByteOrder::Little,
        };

        if descriptor.module_address == 0 {
            warn!(
                "Module '{}' not found; assuming {} {}",
                module, descriptor.pointer_width, descriptor.byte_order
            );
            return descriptor;
        }

        if descriptor.try_parse_pe(options) {
            return descriptor;
        }
        if descriptor.try_parse_elf() {
            return descriptor;
        }

        warn!(
            "Unable to parse executable header in module '{}'; assuming {} {}",
            module, descriptor.pointer_width, descriptor.byte_order
        );
        descriptor
    }

    /// Build a descriptor with a known layout, skipping detection.
    ///
    /// For targets whose layout is fixed and known up front, such as
    /// emulated systems. No module is resolved; the module accessors
    /// return 0.
    pub fn assume(process: P, pointer_width: PointerWidth, byte_order: ByteOrder) -> Self {
        let executable_path = process.executable_path();
        Self {
            process,
            module_address: 0,
            module_size: 0,
            executable_path,
            format: BinaryFormat::Unknown,
            pointer_width,
            byte_order,
        }
    }

    /// Try to classify the main module as PE.
    ///
    /// Returns true once the NT signature has positively identified the
    /// header as PE, even when the machine type is unknown and the width
    /// and order defaults are kept.
    fn try_parse_pe(&mut self, options: &DetectOptions) -> bool {
        let Ok(dos) = self.process.read_bytes(self.module_address, DOS_HEADER_LEN) else {
            return false;
        };
        if dos[..2] != DOS_MAGIC {
            return false;
        }

        // Raw 16-bit value; the target's byte order is still unknown here,
        // but PE headers are little-endian by definition.
        let e_lfanew = u16::from_le_bytes([dos[E_LFANEW_OFFSET], dos[E_LFANEW_OFFSET + 1]]);

        let nt_address = self.module_address + e_lfanew as u64;
        let Ok(nt) = self.process.read_bytes(nt_address, NT_HEADER_LEN) else {
            warn!("Failed to read NT header at {:#x}", nt_address);
            return false;
        };
        if nt[..4] != NT_SIGNATURE {
            warn!(
                "PE has invalid NT signature {:02x}{:02x}{:02x}{:02x}",
                nt[0], nt[1], nt[2], nt[3]
            );
            return false;
        }

        self.format = BinaryFormat::Pe;

        if options.fix_undersized_module && self.module_size == UNDERSIZED_MODULE_SIZE {
            let size_of_image = u32::from_le_bytes([
                nt[SIZE_OF_IMAGE_OFFSET],
                nt[SIZE_OF_IMAGE_OFFSET + 1],
                nt[SIZE_OF_IMAGE_OFFSET + 2],
                nt[SIZE_OF_IMAGE_OFFSET + 3],
            ]);
            debug!(
                "Main module size reported as one page; using image size {:#x} from PE header",
                size_of_image
            );
            self.module_size = size_of_image as u64;
        }

        let machine = u16::from_le_bytes([nt[MACHINE_OFFSET], nt[MACHINE_OFFSET + 1]]);
        match machine {
            IMAGE_FILE_MACHINE_AMD64 => {
                self.pointer_width = PointerWidth::Bits64;
                self.byte_order = ByteOrder::Little;
            }
            IMAGE_FILE_MACHINE_I386 => {
                self.pointer_width = PointerWidth::Bits32;
                self.byte_order = ByteOrder::Little;
            }
            other => {
                warn!(
                    "PE has unknown machine type {:#06x}; assuming {} {}",
                    other, self.pointer_width, self.byte_order
                );
            }
        }

        true
    }

    fn try_parse_elf(&mut self) -> bool {
        let Ok(ident) = self.process.read_bytes(self.module_address, ELF_IDENT_LEN) else {
            return false;
        };
        if ident[..4] != ELF_MAGIC {
            return false;
        }

        self.format = BinaryFormat::Elf;

        match ident[4] {
            ELFCLASS32 => self.pointer_width = PointerWidth::Bits32,
            ELFCLASS64 => self.pointer_width = PointerWidth::Bits64,
            other => debug!("ELF has unknown class {}", other),
        }
        match ident[5] {
            ELFDATA2LSB => self.byte_order = ByteOrder::Little,
            ELFDATA2MSB => self.byte_order = ByteOrder::Big,
            other => debug!("ELF has unknown data encoding {}", other),
        }

        true
    }

    pub fn process(&self) -> &P {
        &self.process
    }

    /// Whether the underlying process is still open.
    pub fn is_open(&self) -> bool {
        self.process.is_open()
    }

    pub fn module_address(&self) -> Address {
        self.module_address
    }

    pub fn module_size(&self) -> u64 {
        self.module_size
    }

    pub fn executable_path(&self) -> &str {
        &self.executable_path
    }

    pub fn format(&self) -> BinaryFormat {
        self.format
    }

    pub fn pointer_width(&self) -> PointerWidth {
        self.pointer_width
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Give the process handle back, discarding the layout snapshot.
    pub fn into_inner(self) -> P {
        self.process
    }

    /// Read a scalar at `address`, decoded in the target's byte order.
    pub fn read<T: MemValue>(&self, address: Address) -> Result<T> {
        T::read_from(&self.process, address, self.byte_order)
    }

    /// Read an address-sized value at `address` and normalize it.
    ///
    /// Reads 4 or 8 bytes per the target's pointer width, corrects the byte
    /// order, and zero-extends 32-bit values. Returns 0 on failure; 0 is
    /// also the target's own null, so a 0 result always means "no value".
    pub fn read_address(&self, address: Address) -> Address {
        let value = match self.pointer_width {
            PointerWidth::Bits32 => {
                u32::read_from(&self.process, address, self.byte_order).map(u64::from)
            }
            PointerWidth::Bits64 => u64::read_from(&self.process, address, self.byte_order),
        };
        value.unwrap_or(0)
    }

    /// Decode an x86 relative-addressing operand at `address`.
    ///
    /// Reads the signed 32-bit displacement and resolves it against the end
    /// of the operand, i.e. `address + 4 + displacement`. Returns 0 if the
    /// displacement can't be read.
    pub fn read_x86_offset(&self, address: Address) -> Address {
        match i32::read_from(&self.process, address, self.byte_order) {
            Ok(displacement) => address.wrapping_add(4).wrapping_add_signed(displacement as i64),
            Err(_) => 0,
        }
    }

    /// Read a NUL-terminated UTF-16 string of at most `max_chars` units,
    /// decoded in the target's byte order.
    pub fn read_wide_string(&self, address: Address, max_chars: usize) -> Result<String> {
        let bytes = self.process.read_bytes(address, max_chars * 2)?;
        let len = bytes
            .chunks_exact(2)
            .position(|unit| unit == [0, 0])
            .map_or(bytes.len(), |units| units * 2);
        let encoding = match self.byte_order {
            ByteOrder::Little => encoding_rs::UTF_16LE,
            ByteOrder::Big => encoding_rs::UTF_16BE,
        };
        let (decoded, _, _) = encoding.decode(&bytes[..len]);
        Ok(decoded.into_owned())
    }
}

/// Basename of an executable path, accepting both separator styles since
/// compatibility layers mix them.
fn module_basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
