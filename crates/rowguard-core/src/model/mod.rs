//! Static entity descriptors.
//!
//! Types in `model` describe *what exists*: entities, their scalar fields,
//! relations and unique keys. They are declared once as `'static` data by a
//! schema crate and wired into a [`registry::Registry`] at startup, after
//! which they are read-only and shared by every validation call.
pub mod entity;
pub mod field;
pub mod registry;
pub mod relation;
pub mod unique;

#[cfg(test)]
mod tests;

pub use registry::RegistryError;
