//! PulseChain - an append-only, hash-linked ledger of heart-rate readings
//!
//! # Architecture
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, hashing, validation and the locked [`blockchain::Ledger`]
//!
//! ## Service & Transport
//! - [`service`] - Request-facing wrapper around the ledger
//! - [`api`] - HTTP endpoints (axum)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`logging`] - Tracing subscriber setup

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;

// ============================================================================
// Service & Transport
// ============================================================================
pub mod api;
pub mod service;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod logging;
