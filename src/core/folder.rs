use serde::{Deserialize, Serialize};

use super::note::Id;

/// A named grouping for notes. Notes refer to folders by id only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: Option<Id>,
    pub name: String,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}
