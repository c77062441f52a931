use std::{path::PathBuf, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::ServiceError;
use crate::storage::json_list_store::JsonListStore;

/// The sole domain entity: a registered hero. IDs are assigned by the
/// registry, never supplied by clients.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hero {
    pub id: u64,
    pub name: String,
    pub secret_identity: String,
}

/// Create input: no id, the registry assigns it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeroDraft {
    pub name: String,
    pub secret_identity: String,
}

impl HeroDraft {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }
        if self.secret_identity.trim().is_empty() {
            return Err(ServiceError::Validation("secret_identity must not be empty".into()));
        }
        Ok(())
    }
}

/// Default roster installed when no store file exists yet.
fn seed_heroes() -> Vec<Hero> {
    vec![
        Hero { id: 1, name: "Iron Man".into(), secret_identity: "Tony Stark".into() },
        Hero { id: 2, name: "Captain America".into(), secret_identity: "Steve Rogers".into() },
        Hero { id: 3, name: "Black Widow".into(), secret_identity: "Natasha Romanoff".into() },
    ]
}

/// Sole mediator of the hero collection: all reads and the single mutation
/// path go through here, backed by a JSON file store.
#[derive(Clone)]
pub struct HeroRegistry {
    store: Arc<JsonListStore<Hero>>,
}

impl HeroRegistry {
    /// Open the registry at a file path, seeding the default roster when the
    /// file does not exist yet.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonListStore::open(path, seed_heroes()).await?;
        Ok(Arc::new(Self { store }))
    }

    /// Full collection in insertion order. No pagination or filtering.
    pub async fn list(&self) -> Vec<Hero> {
        self.store.snapshot().await
    }

    /// Linear scan for a hero by id.
    pub async fn get(&self, id: u64) -> Result<Hero, ServiceError> {
        self.store
            .find(|h| h.id == id)
            .await
            .ok_or_else(|| ServiceError::not_found("hero"))
    }

    /// Validate, assign the next id, append, and persist. The id assignment
    /// and append happen inside the store's write guard, so concurrent
    /// creates can never hand out duplicate ids.
    pub async fn create(&self, draft: HeroDraft) -> Result<Hero, ServiceError> {
        draft.validate()?;
        let hero = self
            .store
            .append_with(move |heroes| {
                let next_id = heroes.iter().map(|h| h.id).max().unwrap_or(0) + 1;
                Hero { id: next_id, name: draft.name, secret_identity: draft.secret_identity }
            })
            .await;
        info!(hero_id = hero.id, hero_name = %hero.name, "added new hero");
        Ok(hero)
    }
}
