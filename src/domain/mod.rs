pub mod boundary;
pub mod call;
pub mod codec;
pub mod detector;
pub mod ports;
pub mod tree;
