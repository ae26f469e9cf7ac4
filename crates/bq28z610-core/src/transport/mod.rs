//! Bus backends: the transport trait, the `embedded-hal` adapter and the
//! test mock.

pub mod hal;
pub mod mock;
pub mod traits;

pub use hal::HalTransport;
pub use mock::MockTransport;
pub use traits::{GaugeTransport, TransportError};
