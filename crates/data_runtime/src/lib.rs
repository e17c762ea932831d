//! data_runtime: ability catalog schemas and loaders.
//!
//! Split out from the engine crate so client/server/tooling can depend on a
//! stable data API without pulling in simulation state.

pub mod ability;
pub mod ids;
pub mod loader;
pub mod specdb;
