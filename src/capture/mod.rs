pub mod device;
pub mod layers;
pub mod parser;
pub mod session;
