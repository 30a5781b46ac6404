pub mod delegate;
pub mod device;
