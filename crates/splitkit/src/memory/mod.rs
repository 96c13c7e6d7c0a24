mod process;
mod reader;

#[cfg(test)]
pub mod mock;

pub use process::{Address, RemoteProcess};
pub use reader::{ByteOrder, MemValue, PointerWidth, read_nul_terminated, read_value};

#[cfg(test)]
pub use mock::{MockProcess, MockProcessBuilder};
