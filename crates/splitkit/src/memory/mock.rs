//! In-memory fake of the host process capability for tests.
//!
//! Every attempted read is logged, so tests can assert not just on values
//! but on how many reads an operation issued and where they landed.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{Error, Result};

use super::process::{Address, RemoteProcess};

#[derive(Debug)]
pub struct MockProcess {
    regions: Vec<(Address, Vec<u8>)>,
    failing: Vec<(Address, u64)>,
    modules: HashMap<String, (Address, u64)>,
    executable_path: String,
    open: bool,
    reads: RefCell<Vec<(Address, usize)>>,
}

impl MockProcess {
    pub fn builder() -> MockProcessBuilder {
        MockProcessBuilder::default()
    }

    /// Number of reads attempted so far, successful or not.
    pub fn read_count(&self) -> usize {
        self.reads.borrow().len()
    }

    /// Every attempted read as `(address, length)`, in order.
    pub fn reads(&self) -> Vec<(Address, usize)> {
        self.reads.borrow().clone()
    }
}

impl RemoteProcess for MockProcess {
    fn is_open(&self) -> bool {
        self.open
    }

    fn read_into(&self, address: Address, buf: &mut [u8]) -> Result<()> {
        self.reads.borrow_mut().push((address, buf.len()));

        let len = buf.len() as u64;
        let overlaps_failing = self
            .failing
            .iter()
            .any(|&(start, size)| address < start + size && start < address + len);
        if overlaps_failing {
            return Err(Error::MemoryReadFailed {
                address,
                length: buf.len(),
            });
        }

        for (base, data) in &self.regions {
            if address >= *base && address + len <= *base + data.len() as u64 {
                let offset = (address - base) as usize;
                buf.copy_from_slice(&data[offset..offset + buf.len()]);
                return Ok(());
            }
        }

        Err(Error::MemoryReadFailed {
            address,
            length: buf.len(),
        })
    }

    fn module_address(&self, module: &str) -> Address {
        self.modules.get(module).map_or(0, |&(address, _)| address)
    }

    fn module_size(&self, module: &str) -> u64 {
        self.modules.get(module).map_or(0, |&(_, size)| size)
    }

    fn executable_path(&self) -> String {
        self.executable_path.clone()
    }
}

#[derive(Debug)]
pub struct MockProcessBuilder {
    regions: Vec<(Address, Vec<u8>)>,
    failing: Vec<(Address, u64)>,
    modules: HashMap<String, (Address, u64)>,
    executable_path: String,
    open: bool,
}

impl Default for MockProcessBuilder {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            failing: Vec::new(),
            modules: HashMap::new(),
            executable_path: String::new(),
            open: true,
        }
    }
}

impl MockProcessBuilder {
    /// Map `bytes` at `address`. Reads must fall entirely inside one region.
    pub fn region(mut self, address: Address, bytes: impl Into<Vec<u8>>) -> Self {
        self.regions.push((address, bytes.into()));
        self
    }

    /// Any read overlapping `[address, address + length)` fails, even if a
    /// region also covers it.
    pub fn fail_range(mut self, address: Address, length: u64) -> Self {
        self.failing.push((address, length));
        self
    }

    pub fn module(mut self, name: &str, address: Address, size: u64) -> Self {
        self.modules.insert(name.to_string(), (address, size));
        self
    }

    pub fn executable_path(mut self, path: &str) -> Self {
        self.executable_path = path.to_string();
        self
    }

    pub fn closed(mut self) -> Self {
        self.open = false;
        self
    }

    pub fn build(self) -> MockProcess {
        MockProcess {
            regions: self.regions,
            failing: self.failing,
            modules: self.modules,
            executable_path: self.executable_path,
            open: self.open,
            reads: RefCell::new(Vec::new()),
        }
    }
}
