//! FFI crate exposing planner use cases to the Flutter shell.
//! Generated bridge glue lives outside this crate and is produced by
//! `flutter_rust_bridge_codegen` from `api.rs`.

pub mod api;
