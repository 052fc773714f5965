mod async_task;
mod file_io;

pub(crate) use async_task::*;
pub use file_io::*;
