pub mod apps;
pub mod decision;
pub mod engine;
pub mod index;

pub use decision::Decision;
pub use engine::PolicyEngine;
pub use index::{BlocklistMeta, Index, IndexBuilder};
