//! Signature scanning over a foreign process's memory.
//!
//! The region to search is usually far larger than one read, so memory is
//! pulled in fixed-size chunks and a match may straddle a chunk boundary.
//! At the end of each chunk every pattern prefix that matches the chunk's
//! tail is recorded in a per-length flag vector; before the next chunk's
//! interior scan, each flagged prefix is completed against the chunk's head.
//! The interior scan covers starts up to and including the position where
//! the pattern sits flush with the chunk end, so a prefix is only ever
//! recorded for a match that actually crosses the boundary.

mod pattern;
mod signature;

use tracing::warn;

use crate::descriptor::ProcessDescriptor;
use crate::memory::{Address, RemoteProcess};

pub use pattern::Pattern;
pub use signature::{NamedSignature, SignatureSet, load_signatures, save_signatures};

/// Bytes read from the target per chunk.
pub const SCAN_CHUNK_SIZE: usize = 0x1000;

/// Search `size` bytes starting at `start` for `pattern`.
///
/// Returns the absolute address of the first match plus the pattern's
/// result offset, or 0 if the pattern isn't present. A chunk read failure
/// aborts the whole scan and returns 0 immediately; partial results are
/// never produced. Patterns longer than twice the chunk size are
/// unsupported since the carry-over state is one chunk deep.
pub fn scan<P: RemoteProcess + ?Sized>(
    process: &P,
    pattern: &Pattern,
    start: Address,
    size: u64,
) -> Address {
    let len = pattern.len();
    if size == 0 {
        return 0;
    }
    if len > 2 * SCAN_CHUNK_SIZE {
        warn!(
            "Pattern of {} bytes exceeds the {}-byte scan carry limit",
            len,
            2 * SCAN_CHUNK_SIZE
        );
        return 0;
    }

    let end = start.saturating_add(size);
    let mut partial = vec![false; len];
    let mut chunk = vec![0u8; SCAN_CHUNK_SIZE];
    let mut chunk_start = start;

    while chunk_start < end {
        if process.read_into(chunk_start, &mut chunk).is_err() {
            return 0;
        }

        // Matches crossing the start of this chunk, flagged while scanning
        // the previous one. Smallest prefix first, matching the interior
        // scan's first-match-wins order.
        if let Some(prefix_len) = finish_partial_matches(pattern, &chunk, &partial) {
            return found(chunk_start - prefix_len as u64, pattern);
        }

        if let Some(position) = interior_match(pattern, &chunk, chunk_start, end) {
            return found(chunk_start + position as u64, pattern);
        }

        record_partial_matches(pattern, &chunk, &mut partial);
        chunk_start += SCAN_CHUNK_SIZE as u64;
    }

    0
}

/// Scan a descriptor's whole main module.
pub fn scan_main_module<P: RemoteProcess>(
    descriptor: &ProcessDescriptor<P>,
    pattern: &Pattern,
) -> Address {
    scan(
        descriptor.process(),
        pattern,
        descriptor.module_address(),
        descriptor.module_size(),
    )
}

fn found(address: Address, pattern: &Pattern) -> Address {
    address.wrapping_add_signed(pattern.offset())
}

fn masked_eq(window: &[u8], bytes: &[u8], mask: &[u8]) -> bool {
    window
        .iter()
        .zip(bytes)
        .zip(mask)
        .all(|((&seen, &byte), &mask)| (seen & mask) == byte)
}

/// Check whether any prefix flagged at the previous chunk's tail completes
/// at the head of this chunk. Returns the prefix length on a match.
fn finish_partial_matches(pattern: &Pattern, chunk: &[u8], partial: &[bool]) -> Option<usize> {
    let len = pattern.len();
    for prefix_len in 1..len {
        if !partial[prefix_len] {
            continue;
        }
        let remaining = len - prefix_len;
        if remaining > chunk.len() {
            // Would straddle a second boundary; carry-over is one chunk deep.
            continue;
        }
        if masked_eq(
            &chunk[..remaining],
            &pattern.bytes()[prefix_len..],
            &pattern.mask()[prefix_len..],
        ) {
            return Some(prefix_len);
        }
    }
    None
}

/// Scan for matches lying entirely within this chunk. Starts past
/// `chunk.len() - pattern.len()` can't fit and are left to the boundary
/// carry; starts at or beyond the region end are excluded.
fn interior_match(
    pattern: &Pattern,
    chunk: &[u8],
    chunk_start: Address,
    end: Address,
) -> Option<usize> {
    let len = pattern.len();
    if len > chunk.len() {
        return None;
    }
    let max_start = ((chunk.len() - len) as u64).min(end - chunk_start - 1) as usize;

    let first_byte = pattern.bytes()[0];
    if pattern.mask()[0] == 0xFF {
        // Fully specified leading byte: let memchr skip to candidates.
        let mut from = 0;
        while from <= max_start {
            let position = memchr::memchr(first_byte, &chunk[from..=max_start])? + from;
            if pattern.matches(&chunk[position..]) {
                return Some(position);
            }
            from = position + 1;
        }
        None
    } else {
        (0..=max_start).find(|&position| pattern.matches(&chunk[position..]))
    }
}

/// Record, for every prefix length, whether the chunk's tail matches the
/// pattern's head. Indexed by prefix length; index 0 stays unused.
fn record_partial_matches(pattern: &Pattern, chunk: &[u8], partial: &mut [bool]) {
    let len = pattern.len();
    let max_prefix = (len - 1).min(chunk.len());
    for prefix_len in 1..=max_prefix {
        let tail = &chunk[chunk.len() - prefix_len..];
        partial[prefix_len] = masked_eq(tail, pattern.bytes(), pattern.mask());
    }
    for flag in partial.iter_mut().skip(max_prefix + 1) {
        *flag = false;
    }
}
