//! Wire-level building blocks: device constants, value codec and the
//! AltManufacturerAccess block frame.

pub mod codec;
pub mod constants;
pub mod frame;

pub use codec::{CodecError, WordOrder};
pub use frame::BlockFrame;
