//! UCI protocol front end for vesper.

pub mod command;
pub mod engine;
pub mod error;
pub mod info;

pub use command::{GoParams, UciOption};
pub use engine::UciEngine;
pub use error::UciError;
