//! Typed reads from a remote process.
//!
//! Rather than a generic "read any struct" primitive, each scalar type gets
//! an explicit size-checked decoder, so reads are never affected by padding
//! or alignment differences between the host and the target. Multi-byte
//! values can be decoded in either byte order; the raw [`read_value`] entry
//! point uses the host's order, while [`ProcessDescriptor::read`] applies
//! the target's detected order.
//!
//! [`ProcessDescriptor::read`]: crate::descriptor::ProcessDescriptor::read

use strum::Display;

use crate::error::Result;

use super::process::{Address, RemoteProcess};

/// Byte order of multi-byte values in the target process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ByteOrder {
    #[strum(serialize = "little-endian")]
    Little,
    #[strum(serialize = "big-endian")]
    Big,
}

impl ByteOrder {
    /// The byte order of the host this code is running on.
    pub const fn host() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

/// Pointer width of the target process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PointerWidth {
    #[strum(serialize = "32-bit")]
    Bits32,
    #[strum(serialize = "64-bit")]
    Bits64,
}

impl PointerWidth {
    /// Size of an address in the target, in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            PointerWidth::Bits32 => 4,
            PointerWidth::Bits64 => 8,
        }
    }
}

/// A scalar value that can be decoded from remote memory in a given byte
/// order.
pub trait MemValue: Sized {
    /// Number of bytes read per value.
    const SIZE: usize;

    /// Read one value at `address`, decoded in `order`.
    fn read_from<P: RemoteProcess + ?Sized>(
        process: &P,
        address: Address,
        order: ByteOrder,
    ) -> Result<Self>;
}

macro_rules! impl_mem_value {
    ($($ty:ty),* $(,)?) => {$(
        impl MemValue for $ty {
            const SIZE: usize = size_of::<$ty>();

            fn read_from<P: RemoteProcess + ?Sized>(
                process: &P,
                address: Address,
                order: ByteOrder,
            ) -> Result<Self> {
                let mut buf = [0u8; size_of::<$ty>()];
                process.read_into(address, &mut buf)?;
                Ok(match order {
                    ByteOrder::Little => <$ty>::from_le_bytes(buf),
                    ByteOrder::Big => <$ty>::from_be_bytes(buf),
                })
            }
        }
    )*};
}

impl_mem_value!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Read a scalar at `address` as a raw copy, decoded in host order.
///
/// For values whose byte order belongs to the target process, go through
/// the descriptor's endian-corrected read instead.
pub fn read_value<T: MemValue, P: RemoteProcess + ?Sized>(
    process: &P,
    address: Address,
) -> Result<T> {
    T::read_from(process, address, ByteOrder::host())
}

/// Read a NUL-terminated narrow string of at most `max_len` bytes.
///
/// The whole buffer is read in one operation; bytes past the first NUL are
/// dropped. Non-UTF-8 bytes are replaced rather than failing the read.
pub fn read_nul_terminated<P: RemoteProcess + ?Sized>(
    process: &P,
    address: Address,
    max_len: usize,
) -> Result<String> {
    let bytes = process.read_bytes(address, max_len)?;
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Ok(String::from_utf8_lossy(&bytes[..len]).into_owned())
}
