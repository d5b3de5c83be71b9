// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Berth control plane
//!
//! This crate implements common facilities used across the control plane:
//! the error type that every component returns, the resource vocabulary those
//! errors refer to, and small helpers for command-line programs.  Other
//! top-level crates implement pieces of the control plane (e.g.,
//! `berth_authz`).

// We only use rustdoc for internal documentation, including private items, so
// it's expected that we'll have links to private items in the docs.
#![allow(rustdoc::private_intra_doc_links)]

pub mod api;
pub mod cmd;
