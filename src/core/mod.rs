pub mod date;
pub mod folder;
pub mod note;
pub mod task;

pub use folder::Folder;
pub use note::{Id, Note};
pub use task::{Priority, Task};
