use crate::error::Result;

/// An address in the target process.
///
/// Always held as a `u64` regardless of the target's pointer width; 32-bit
/// addresses are zero-extended on read. The value 0 is reserved to mean
/// "no value" throughout the crate: a broken pointer path, a missing module,
/// a failed scan.
pub type Address = u64;

/// The host-provided capability to inspect an attached process.
///
/// The surrounding runtime owns attachment and detachment; this trait only
/// models what can be done with an already-attached handle. Every read is
/// synchronous, non-cancellable, and reflects a possibly-stale snapshot of
/// the target's memory. Implementations must not retry internally; a failed
/// read is reported immediately and retry-on-next-tick is the caller's
/// decision.
pub trait RemoteProcess {
    /// Whether the process is still open. Once this returns `false`, every
    /// object referencing the process should be dropped.
    fn is_open(&self) -> bool;

    /// Read exactly `buf.len()` bytes at `address` into `buf`.
    fn read_into(&self, address: Address, buf: &mut [u8]) -> Result<()>;

    /// The load address of a module, or 0 if it can't be found.
    fn module_address(&self, module: &str) -> Address;

    /// The size of a module, or 0 if it can't be found.
    fn module_size(&self, module: &str) -> u64;

    /// The path of the process's executable, as reported by the host.
    fn executable_path(&self) -> String;

    /// Read `len` bytes at `address` into a fresh buffer.
    fn read_bytes(&self, address: Address, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_into(address, &mut buf)?;
        Ok(buf)
    }
}
