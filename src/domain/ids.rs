//! Type-safe entity identifiers.
//!
//! Each persisted entity gets its own newtype around [`uuid::Uuid`] (v4)
//! so identifiers of different entities cannot be confused at API
//! boundaries or store calls.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Creates an identifier from an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id! {
    /// Unique identifier for a user account.
    UserId
}

entity_id! {
    /// Unique identifier for a metaverse instance.
    MetaverseId
}

entity_id! {
    /// Unique identifier for a project.
    ProjectId
}

entity_id! {
    /// Unique identifier for an uploaded asset.
    AssetId
}

entity_id! {
    /// Unique identifier for a build job.
    BuildJobId
}

entity_id! {
    /// Unique identifier for a subscription.
    SubscriptionId
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        let a = MetaverseId::new();
        let b = MetaverseId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_uuid_format() {
        let id = MetaverseId::new();
        let s = format!("{id}");
        assert_eq!(s.len(), 36); // UUID string length
        assert!(s.contains('-'));
    }

    #[test]
    fn serde_round_trip() {
        let id = BuildJobId::new();
        let json = serde_json::to_string(&id).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        let deserialized: BuildJobId = serde_json::from_str(&json).ok().unwrap_or_else(|| {
            panic!("deserialization failed");
        });
        assert_eq!(id, deserialized);
    }

    #[test]
    fn from_uuid_round_trip() {
        let uuid = uuid::Uuid::new_v4();
        let id = ProjectId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn hash_works_in_hashmap() {
        use std::collections::HashMap;
        let id = MetaverseId::new();
        let mut map = HashMap::new();
        map.insert(id, "test");
        assert_eq!(map.get(&id), Some(&"test"));
    }
}
