#![doc = include_str!("../README.md")]

pub mod stats;

mod conf;
pub use conf::{BuildConf, ConfError};

mod error;
pub use error::BuildError;

mod matrix;
pub use matrix::KeyMatrix;

mod order;
pub use order::{RowOrder, RowDescriptor};

mod packer;
pub use packer::Packer;

mod function;
pub use function::Function;

mod report;
pub use report::{Summary, Report};

pub use dyn_size_of::GetSize;
