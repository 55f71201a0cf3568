//! Persistent entity model: optional integer identity plus store-assigned timestamps.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub type EntityId = i32;

/// Identity block shared by all entities. Flattened into the entity's JSON as `id`, `created`, `modified`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentObject {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

impl PersistentObject {
    pub fn with_id(id: EntityId) -> Self {
        PersistentObject {
            id: Some(id),
            ..Default::default()
        }
    }
}

/// A record that can be stored by a [`crate::dao::Dao`] and exposed by the entity routes.
///
/// `id() == None` means transient: the entity is not in the store. Once saved, the store
/// assigns the id and the timestamps; an entity with an id must exist in the store.
pub trait PersistentEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Name used in logs, error messages and as the default table name.
    const ENTITY_NAME: &'static str;

    fn base(&self) -> &PersistentObject;

    fn base_mut(&mut self) -> &mut PersistentObject;

    fn id(&self) -> Option<EntityId> {
        self.base().id
    }

    fn is_transient(&self) -> bool {
        self.base().id.is_none()
    }

    /// Same entity with the given identity.
    fn with_id(mut self, id: Option<EntityId>) -> Self {
        self.base_mut().id = id;
        self
    }

    /// Transient copy: id and timestamps cleared. Saving it creates a new record.
    fn detached(mut self) -> Self {
        *self.base_mut() = PersistentObject::default();
        self
    }
}

/// Implements [`PersistentEntity`] for a struct holding its identity in a `base: PersistentObject` field.
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Layer {
///     #[serde(flatten)]
///     base: PersistentObject,
///     name: String,
/// }
/// impl_persistent_entity!(Layer, "layer");
/// ```
#[macro_export]
macro_rules! impl_persistent_entity {
    ($ty:ty, $name:expr) => {
        impl $crate::entity::PersistentEntity for $ty {
            const ENTITY_NAME: &'static str = $name;

            fn base(&self) -> &$crate::entity::PersistentObject {
                &self.base
            }

            fn base_mut(&mut self) -> &mut $crate::entity::PersistentObject {
                &mut self.base
            }
        }
    };
}
