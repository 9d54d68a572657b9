//! Virtual resource path translation.

pub mod translator;

pub use translator::{Namespace, ResolvedResource, ResourceTranslator};
