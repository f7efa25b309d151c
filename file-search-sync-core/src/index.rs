//! Create-or-get for the named search index.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{error, info};

use crate::contract::IndexStore;
use crate::error::SyncError;

/// The index a run works against, whether it was reused or just created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexHandle {
    pub id: String,
    pub name: String,
}

/// Return the index called `name`, creating it only when `existing` has no entry for it.
pub async fn create_or_get_index<I>(
    store: &I,
    name: &str,
    existing: &HashMap<String, String>,
) -> Result<IndexHandle, SyncError>
where
    I: IndexStore + ?Sized,
{
    if let Some(id) = existing.get(name) {
        info!(index_name = name, index_id = %id, "[SYNC][INDEX] Reusing existing index");
        return Ok(IndexHandle {
            id: id.clone(),
            name: name.to_string(),
        });
    }

    info!(index_name = name, "[SYNC][INDEX] Creating new index");
    let created = store.create_index(name).await.map_err(|source| {
        error!(index_name = name, error = ?source, "[SYNC][ERROR][INDEX] create_index failed");
        SyncError::CreateIndex {
            name: name.to_string(),
            source,
        }
    })?;
    info!(index_id = %created.id, "[SYNC][INDEX] Index created");

    Ok(IndexHandle {
        id: created.id,
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{MockIndexStore, RemoteIndex};

    #[tokio::test]
    async fn existing_index_is_reused_without_create() {
        let mut store = MockIndexStore::new();
        store.expect_create_index().never();
        let existing = HashMap::from([("zola_posts".to_string(), "idx1".to_string())]);

        let handle = create_or_get_index(&store, "zola_posts", &existing)
            .await
            .unwrap();

        assert_eq!(
            handle,
            IndexHandle {
                id: "idx1".into(),
                name: "zola_posts".into()
            }
        );
    }

    #[tokio::test]
    async fn missing_index_is_created_once() {
        let mut store = MockIndexStore::new();
        store
            .expect_create_index()
            .withf(|name| name == "zola_posts")
            .times(1)
            .returning(|name| {
                Ok(RemoteIndex {
                    id: "idx2".into(),
                    name: name.to_string(),
                })
            });
        let existing = HashMap::from([("other".to_string(), "idx9".to_string())]);

        let handle = create_or_get_index(&store, "zola_posts", &existing)
            .await
            .unwrap();

        assert_eq!(handle.id, "idx2");
        assert_eq!(handle.name, "zola_posts");
    }
}
