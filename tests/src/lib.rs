//! # Merit-Chain Test Suite
//!
//! Cross-subsystem integration tests driving whole nodes over the
//! loopback relay: the end-to-end edition lifecycle, candidate
//! competition between full nodes, and light-node catch-up.

#[cfg(test)]
mod harness;

#[cfg(test)]
mod integration;
