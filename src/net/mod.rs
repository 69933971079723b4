//! Network-edge concerns: TLS termination for the listener.

pub mod tls;
