//! Serialization and deserialization for BPE models.
//!
//! A saved tokenizer is a model file (`<prefix>.model`, JSON or text) plus
//! a human-readable vocabulary listing (`<prefix>.vocab`).

pub mod format;
pub mod load;
pub mod save;

pub use format::ModelFormat;
pub use load::{LoadedModel, ModelLoader};
pub use save::{render_token, ModelSaver};
