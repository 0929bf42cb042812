use serde::{Deserialize, Serialize};

use vitrina_core::{CategoryId, DomainError, DomainResult, Entity};

pub const NAME_MAX_CHARS: usize = 150;

/// A product category. Deleting one leaves its products uncategorised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
}

impl Category {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        if name.chars().count() > NAME_MAX_CHARS {
            return Err(DomainError::validation(format!(
                "category name cannot exceed {NAME_MAX_CHARS} characters"
            )));
        }
        Ok(Self {
            id: CategoryId::new(),
            name,
            description: description.into(),
        })
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
