//! Character actors
//!
//! Each character runs as one tokio task that owns its [`CharacterState`]
//! and drains a single-consumer queue. Actions and events for the same
//! character are therefore applied one at a time in arrival order, while
//! different characters run fully in parallel.

mod roster;

pub use roster::{Roster, RosterError};

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::actions::{ActionHandler, ActionProcessor, ActionResult};
use crate::character::{CharacterInfo, CharacterSheet, CharacterState, CombatPhase, GameState};
use crate::dice::DiceEngine;
use crate::events::{DispatchOutcome, EventAck, EventDispatcher, EventHook, TurnStrategy};
use crate::store::{CharacterStore, StoreError};

/// Default mailbox depth per character
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// Actor communication errors
#[derive(Debug, Error)]
pub enum ActorError {
    #[error("character actor {0} has stopped")]
    Closed(String),
}

/// Reply to `join_session`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionJoin {
    pub success: bool,
    pub character_info: CharacterInfo,
}

/// Reply to `leave_session`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLeave {
    pub success: bool,
    pub session_id: Option<String>,
}

/// Persistence bookkeeping for an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorStatus {
    pub version: u64,
    pub persist_failures: u64,
}

enum Command {
    Process {
        action_type: String,
        data: serde_json::Value,
        reply: oneshot::Sender<ActionResult>,
    },
    Dispatch {
        event_type: String,
        data: serde_json::Value,
        reply: oneshot::Sender<DispatchOutcome>,
    },
    EndTurn {
        reply: oneshot::Sender<CombatPhase>,
    },
    JoinSession {
        session_id: String,
        game_state: GameState,
        auth_token: Option<String>,
        reply: oneshot::Sender<SessionJoin>,
    },
    LeaveSession {
        reply: oneshot::Sender<SessionLeave>,
    },
    Info {
        reply: oneshot::Sender<CharacterInfo>,
    },
    Sheet {
        reply: oneshot::Sender<CharacterSheet>,
    },
    Status {
        reply: oneshot::Sender<ActorStatus>,
    },
}

/// Configures and spawns a character actor.
///
/// Extension strategies are registered here, before the actor starts.
pub struct ActorBuilder {
    store: Arc<dyn CharacterStore>,
    id: String,
    name: String,
    class: String,
    level: u32,
    queue_depth: usize,
    action_dice: DiceEngine,
    event_dice: DiceEngine,
    action_handlers: Vec<(String, Arc<dyn ActionHandler>)>,
    event_hooks: Vec<(String, Arc<dyn EventHook>)>,
    strategy: Option<Arc<dyn TurnStrategy>>,
}

impl ActorBuilder {
    pub fn new(store: Arc<dyn CharacterStore>, id: &str) -> Self {
        Self {
            store,
            id: id.to_string(),
            name: id.to_string(),
            class: "fighter".to_string(),
            level: 1,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            action_dice: DiceEngine::default(),
            event_dice: DiceEngine::default(),
            action_handlers: Vec::new(),
            event_hooks: Vec::new(),
            strategy: None,
        }
    }

    /// Character this builder will load
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name, class and level used when no snapshot exists
    pub fn defaults(mut self, name: &str, class: &str, level: u32) -> Self {
        self.name = name.to_string();
        self.class = class.to_string();
        self.level = level;
        self
    }

    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }

    /// Dice for action resolution
    pub fn action_dice(mut self, dice: DiceEngine) -> Self {
        self.action_dice = dice;
        self
    }

    /// Dice for event handling (initiative)
    pub fn event_dice(mut self, dice: DiceEngine) -> Self {
        self.event_dice = dice;
        self
    }

    pub fn action_handler(mut self, tag: &str, handler: Arc<dyn ActionHandler>) -> Self {
        self.action_handlers.push((tag.to_string(), handler));
        self
    }

    pub fn event_hook(mut self, tag: &str, hook: Arc<dyn EventHook>) -> Self {
        self.event_hooks.push((tag.to_string(), hook));
        self
    }

    pub fn turn_strategy(mut self, strategy: Arc<dyn TurnStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Load the character and start its task
    pub async fn spawn(self) -> Result<CharacterHandle, StoreError> {
        let state =
            CharacterState::load(self.store, &self.id, &self.name, &self.class, self.level)
                .await?;

        let mut processor = ActionProcessor::new(self.action_dice);
        for (tag, handler) in self.action_handlers {
            processor.register(&tag, handler);
        }

        let mut dispatcher = EventDispatcher::new(self.event_dice);
        for (tag, hook) in self.event_hooks {
            dispatcher.register_hook(&tag, hook);
        }
        if let Some(strategy) = self.strategy {
            dispatcher.set_strategy(strategy);
        }

        let (tx, rx) = mpsc::channel(self.queue_depth);
        let actor = CharacterActor {
            state,
            processor,
            dispatcher,
        };
        tokio::spawn(actor.run(rx));

        Ok(CharacterHandle { id: self.id, tx })
    }
}

/// The task-side owner of one character
struct CharacterActor {
    state: CharacterState,
    processor: ActionProcessor,
    dispatcher: EventDispatcher,
}

impl CharacterActor {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        info!("Character actor {} started", self.state.id());

        while let Some(command) = rx.recv().await {
            self.handle(command).await;
        }

        info!("Character actor {} stopped", self.state.id());
    }

    async fn handle(&mut self, command: Command) {
        // A dropped reply receiver only means the caller stopped waiting
        match command {
            Command::Process {
                action_type,
                data,
                reply,
            } => {
                let result = self
                    .processor
                    .process(&mut self.state, &action_type, &data)
                    .await;
                let _ = reply.send(result);
            }
            Command::Dispatch {
                event_type,
                data,
                reply,
            } => {
                let outcome = self.dispatch(&event_type, &data).await;
                let _ = reply.send(outcome);
            }
            Command::EndTurn { reply } => {
                self.state.end_turn().await;
                let _ = reply.send(self.state.phase());
            }
            Command::JoinSession {
                session_id,
                game_state,
                auth_token,
                reply,
            } => {
                self.state.join_session(&session_id, game_state).await;
                self.state.set_auth_token(auth_token);
                let _ = reply.send(SessionJoin {
                    success: true,
                    character_info: self.state.info(),
                });
            }
            Command::LeaveSession { reply } => {
                let session_id = self.state.leave_session().await;
                let _ = reply.send(SessionLeave {
                    success: true,
                    session_id,
                });
            }
            Command::Info { reply } => {
                let _ = reply.send(self.state.info());
            }
            Command::Sheet { reply } => {
                let _ = reply.send(self.state.sheet());
            }
            Command::Status { reply } => {
                let _ = reply.send(ActorStatus {
                    version: self.state.version(),
                    persist_failures: self.state.persist_failures(),
                });
            }
        }
    }

    /// Dispatch an event; a planned turn action is performed in the same
    /// step and the turn ended afterwards.
    async fn dispatch(&mut self, event_type: &str, data: &serde_json::Value) -> DispatchOutcome {
        let outcome = self
            .dispatcher
            .dispatch(&mut self.state, event_type, data)
            .await;

        let mut ack = match outcome {
            DispatchOutcome::Handled(ack) => ack,
            other => return other,
        };

        if let Some(planned) = ack.planned_action.clone() {
            if self.state.can_act() {
                debug!(
                    "{} performing planned {}",
                    self.state.id(),
                    planned.action_type
                );
                let result = self
                    .processor
                    .process(&mut self.state, &planned.action_type, &planned.data)
                    .await;
                ack.action_result = Some(result);
                self.state.end_turn().await;
                ack.phase = Some(self.state.phase());
            } else {
                ack.reason = Some("character cannot act".to_string());
            }
        }

        DispatchOutcome::Handled(ack)
    }
}

/// Caller-side handle to a character actor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CharacterHandle {
    id: String,
    tx: mpsc::Sender<Command>,
}

impl CharacterHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the actor task has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ActorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ActorError::Closed(self.id.clone()))?;
        rx.await.map_err(|_| ActorError::Closed(self.id.clone()))
    }

    /// Validate and resolve an action
    pub async fn process(
        &self,
        action_type: &str,
        data: serde_json::Value,
    ) -> Result<ActionResult, ActorError> {
        self.request(|reply| Command::Process {
            action_type: action_type.to_string(),
            data,
            reply,
        })
        .await
    }

    /// Dispatch an event, keeping the typed outcome
    pub async fn dispatch_outcome(
        &self,
        event_type: &str,
        data: serde_json::Value,
    ) -> Result<DispatchOutcome, ActorError> {
        self.request(|reply| Command::Dispatch {
            event_type: event_type.to_string(),
            data,
            reply,
        })
        .await
    }

    /// Dispatch an event. `None` means the handler failed and the outcome
    /// is unknown.
    pub async fn dispatch(
        &self,
        event_type: &str,
        data: serde_json::Value,
    ) -> Result<Option<EventAck>, ActorError> {
        Ok(self.dispatch_outcome(event_type, data).await?.ack())
    }

    /// End the active turn, returning the resulting phase
    pub async fn end_turn(&self) -> Result<CombatPhase, ActorError> {
        self.request(|reply| Command::EndTurn { reply }).await
    }

    pub async fn join_session(
        &self,
        session_id: &str,
        game_state: GameState,
        auth_token: Option<String>,
    ) -> Result<SessionJoin, ActorError> {
        self.request(|reply| Command::JoinSession {
            session_id: session_id.to_string(),
            game_state,
            auth_token,
            reply,
        })
        .await
    }

    pub async fn leave_session(&self) -> Result<SessionLeave, ActorError> {
        self.request(|reply| Command::LeaveSession { reply }).await
    }

    pub async fn info(&self) -> Result<CharacterInfo, ActorError> {
        self.request(|reply| Command::Info { reply }).await
    }

    pub async fn sheet(&self) -> Result<CharacterSheet, ActorError> {
        self.request(|reply| Command::Sheet { reply }).await
    }

    pub async fn status(&self) -> Result<ActorStatus, ActorError> {
        self.request(|reply| Command::Status { reply }).await
    }
}
