pub mod decode;
pub mod encode;
pub mod monitor;
pub mod ports;
