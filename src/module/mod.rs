//! The configuration tree: [`Module`] nodes owned by a [`ModuleCollection`].

mod collection;
mod node;

pub(crate) use collection::child_path;
pub use collection::ModuleCollection;
pub use node::Module;
