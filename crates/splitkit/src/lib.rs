//! # splitkit
//!
//! Remote-memory introspection for auto splitters.
//!
//! Auto splitters run inside a sandboxed host runtime and watch a game
//! process's memory for timing events. The host hands over only a raw
//! capability to read bytes and resolve modules; this crate builds the
//! layers a splitter actually needs on top of it:
//!
//! - Binary format detection: pointer width and byte order inferred from the
//!   PE/ELF header in the remote process's own memory
//! - Typed, endian-correcting reads of scalars, addresses, and strings
//! - Deep pointer paths chased across the foreign address space
//! - Chunked signature scanning with wildcard patterns, for binaries whose
//!   addresses move between versions
//!
//! ## Example
//!
//! ```ignore
//! use splitkit::{DeepPointer, DetectOptions, Pattern, ProcessDescriptor, scan_main_module};
//!
//! // `process` implements RemoteProcess on top of the host capability.
//! let descriptor = ProcessDescriptor::detect(process, &DetectOptions::default());
//!
//! let pattern = Pattern::parse_with_offset("48 8B 0D ?? ?? ?? ??", 3)?;
//! let instruction = scan_main_module(&descriptor, &pattern);
//! let base = descriptor.read_x86_offset(instruction);
//!
//! let igt = DeepPointer::new(base, vec![0x48, 0x10]);
//! let seconds: f64 = descriptor.read(igt.dereference(&descriptor))?;
//! ```
//!
//! All operations are synchronous and snapshot-based: the target mutates its
//! memory at will, a failed read surfaces immediately, and retrying on the
//! next tick is the caller's call.

pub mod descriptor;
pub mod error;
pub mod memory;
pub mod pointer;
pub mod scan;

pub use descriptor::{BinaryFormat, DetectOptions, ProcessDescriptor};
pub use error::{Error, Result};
pub use memory::{
    Address, ByteOrder, MemValue, PointerWidth, RemoteProcess, read_nul_terminated, read_value,
};
pub use pointer::DeepPointer;
pub use scan::{
    NamedSignature, Pattern, SCAN_CHUNK_SIZE, SignatureSet, load_signatures, save_signatures,
    scan, scan_main_module,
};
