// handlers/protected/mod.rs - Handlers behind the bearer JWT middleware
//
// Route Prefix: /resources, /streams

pub mod resources;
pub mod streams;
