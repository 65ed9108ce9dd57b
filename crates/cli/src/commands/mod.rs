pub mod init;
pub mod memory;
pub mod route;
pub mod services;
pub mod status;
