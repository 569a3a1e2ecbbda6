//! Editing notes: deciding whether a save writes anything, and carrying
//! the write through to the store and the notes widget.

pub mod decision;
pub mod pipeline;
pub mod session;

pub use decision::{SaveAction, decide, note_changed};
pub use pipeline::{Committed, NotePipeline};
pub use session::EditSession;
