//! Domain layer: the data exchanged with the backends and the ports the
//! application layer depends on.

pub mod payment;
pub mod ports;
pub mod processing;
pub mod quota;
pub mod session;
pub mod subscription;
pub mod user;
