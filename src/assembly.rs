pub mod boundary;
pub mod global;
pub mod local;
