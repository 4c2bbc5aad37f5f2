//! Registry of live character actors

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use super::{ActorBuilder, CharacterHandle, DEFAULT_QUEUE_DEPTH};
use crate::dice::DiceEngine;
use crate::store::{CharacterStore, StoreError};

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("character {0} already has a running actor")]
    AlreadyRunning(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Dice seed for one character: the roster seed folded with an FNV-1a
/// hash of the id, so characters under one seed roll different sequences.
fn actor_seed(seed: u64, id: &str) -> u64 {
    id.bytes().fold(seed ^ 0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Hands out one actor per character id
pub struct Roster {
    store: Arc<dyn CharacterStore>,
    actors: RwLock<HashMap<String, CharacterHandle>>,
    queue_depth: usize,
    seed: Option<u64>,
}

impl Roster {
    pub fn new(store: Arc<dyn CharacterStore>) -> Self {
        Self {
            store,
            actors: RwLock::new(HashMap::new()),
            queue_depth: DEFAULT_QUEUE_DEPTH,
            seed: None,
        }
    }

    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }

    /// Seed every spawned actor's dice for reproducible runs. Each actor
    /// derives its own seeds from this one and its id.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Builder preconfigured with this roster's store, depth and dice.
    /// Use it to register extensions, then pass it to `insert`.
    pub fn builder(&self, id: &str) -> ActorBuilder {
        let builder = ActorBuilder::new(self.store.clone(), id).queue_depth(self.queue_depth);
        match self.seed.map(|seed| actor_seed(seed, id)) {
            Some(seed) => builder
                .action_dice(DiceEngine::seeded(seed))
                .event_dice(DiceEngine::seeded(seed.wrapping_add(1))),
            None => builder,
        }
    }

    /// Spawn an actor from a builder and track it. Fails while another
    /// actor for the same id is still running; a closed one is replaced.
    pub async fn insert(&self, builder: ActorBuilder) -> Result<CharacterHandle, RosterError> {
        let mut actors = self.actors.write().await;
        if actors.get(builder.id()).is_some_and(|h| !h.is_closed()) {
            return Err(RosterError::AlreadyRunning(builder.id().to_string()));
        }

        let handle = builder.spawn().await?;
        actors.insert(handle.id().to_string(), handle.clone());
        info!("Roster now tracks {} characters", actors.len());

        Ok(handle)
    }

    /// Existing actor for `id`, or a newly loaded one using the given
    /// defaults when none is running
    pub async fn get_or_spawn(
        &self,
        id: &str,
        name: &str,
        class: &str,
        level: u32,
    ) -> Result<CharacterHandle, StoreError> {
        if let Some(handle) = self.get(id).await {
            return Ok(handle);
        }

        let mut actors = self.actors.write().await;
        // another caller may have won the race
        if let Some(handle) = actors.get(id).filter(|h| !h.is_closed()) {
            return Ok(handle.clone());
        }

        let handle = self
            .builder(id)
            .defaults(name, class, level)
            .spawn()
            .await?;
        actors.insert(id.to_string(), handle.clone());
        info!("Roster now tracks {} characters", actors.len());

        Ok(handle)
    }

    /// Running actor for `id`
    pub async fn get(&self, id: &str) -> Option<CharacterHandle> {
        self.actors
            .read()
            .await
            .get(id)
            .filter(|h| !h.is_closed())
            .cloned()
    }

    /// Stop tracking `id`. The actor exits once every handle is dropped.
    pub async fn remove(&self, id: &str) -> Option<CharacterHandle> {
        self.actors.write().await.remove(id)
    }

    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.actors.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
