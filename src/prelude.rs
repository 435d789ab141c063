//! Traits needed to use frames and the bus
pub use ecan_core::Dependencies as _;
pub use embedded_can::nb::Can as _;
pub use embedded_can::Frame as _;
