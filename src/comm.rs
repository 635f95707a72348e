//! Communicator implementations
#[cfg(feature = "mpi")]
mod message_passing;
mod serial;
mod threaded;

#[cfg(feature = "mpi")]
pub use message_passing::MpiComm;
pub use serial::SerialComm;
pub use threaded::ThreadComm;
