//! # SessionMesh Test Suite
//!
//! Unified test crate containing cross-crate integration flows:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs          # Scripted engine, prompt, cluster helpers
//!     ├── login_flow.rs        # End-to-end login and shutdown choreography
//!     ├── remote_routing.rs    # Execute/event routing across the bus
//!     ├── fanout.rs            # Multiplexer fan-out properties
//!     └── binlog_migration.rs  # Ownership-migration reconciliation
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p sm-tests
//!
//! # By flow
//! cargo test -p sm-tests integration::login_flow
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
