//! Local-key wallet provider
//!
//! A wallet provider backed by an in-process signing key, for headless use
//! where no browser wallet exists. The private key never leaves this module
//! and is never logged.

mod local;

pub use local::LocalWalletProvider;
