// TailPane - core/mod.rs
//
// Core business logic layer.
// Dependencies: standard library, serde, chrono.
// Must NOT depend on: platform, app, or any I/O beyond LogSource::describe.

pub mod model;
pub mod scroll;
