// Library root
// -----------
// This crate exposes the MoltPhone call client as a library. The binary
// (`main.rs`) parses arguments and dispatches to these modules.
//
// Module responsibilities:
// - `config`: endpoint and credential settings, plus the assistant
//   defaults that per-call overrides are merged onto.
// - `model`: request shapes and the normalization of loosely-shaped
//   server responses into typed values.
// - `error`: the failure taxonomy and its process exit codes.
// - `api`: the blocking HTTP transport and the client that knows the
//   MoltPhone endpoints.
// - `render`: plain-text formatting of every report.
// - `commands`: one function per CLI command, writing to any `Write`.
// - `ui`: the interactive menu.
pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod render;
pub mod ui;
