use serde::{Deserialize, Serialize};

use vitrina_core::{Entity, ProductId, VersionId};

/// A numbered revision of a product. At most one per product is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: VersionId,
    pub product_id: ProductId,
    pub version_number: u32,
    pub version_name: String,
    pub is_active: bool,
}

impl Version {
    pub fn new(
        product_id: ProductId,
        version_number: u32,
        version_name: impl Into<String>,
        is_active: bool,
    ) -> Self {
        Self {
            id: VersionId::new(),
            product_id,
            version_number,
            version_name: version_name.into(),
            is_active,
        }
    }
}

impl Entity for Version {
    type Id = VersionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
