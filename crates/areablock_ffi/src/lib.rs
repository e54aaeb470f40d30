//! Host-facing bindings for the AreaBlock app and its extensions.

pub mod api;
