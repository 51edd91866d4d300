pub mod build;
pub mod derive;
pub mod registry;
pub mod validate;
