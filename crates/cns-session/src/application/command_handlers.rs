//! Command handlers for navigation sessions.
//!
//! The [`NavigationEngine`] maps each navigation request onto the session
//! registry and the content structure state machine, then emits the
//! content-seen notification and the display command for the resulting node.

use std::sync::Arc;
use std::time::Duration;

use cns_core::clock::Clock;
use cns_core::command::Command;
use cns_core::error::NavigationError;
use cns_structure::application::loader::StructureLoader;
use cns_structure::domain::node::NodeRef;
use cns_structure::domain::policy::{FollowNextLink, NextNodePolicy};
use cns_structure::domain::structure::{ContentStructure, SequenceBoundary, Step};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ports::{ContentSeenPublisher, DeliveryPort};
use super::query_handlers::no_active_session;
use super::registry::SessionRegistry;
use crate::domain::commands::{NavigationCommand, NavigationKind};
use crate::domain::display::DisplayCommand;
use crate::domain::events::{ContentSeen, ContentSeenEvent};

/// The node handed to the renderer by a navigation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredNode {
    /// Content id of the delivered node.
    pub content_id: String,
    /// Title of the delivered node.
    pub title: String,
    /// Position of the node in its structure.
    pub position: NodeRef,
    /// Set when the step hit an end of the chain.
    pub boundary: Option<SequenceBoundary>,
    /// ID of the content-seen notification that was published.
    pub event_id: Uuid,
}

/// Result of a successfully handled navigation command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// A node was delivered.
    Delivered(DeliveredNode),
    /// The structure was dropped. `removed` is false if none was registered.
    Finished {
        /// Whether an entry existed for the key.
        removed: bool,
    },
}

/// Applies navigation commands to the structures held by a
/// [`SessionRegistry`].
pub struct NavigationEngine {
    registry: Arc<SessionRegistry>,
    loader: Arc<dyn StructureLoader>,
    policy: Arc<dyn NextNodePolicy>,
    publisher: Arc<dyn ContentSeenPublisher>,
    delivery: Arc<dyn DeliveryPort>,
    clock: Arc<dyn Clock>,
    load_timeout: Option<Duration>,
}

impl std::fmt::Debug for NavigationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationEngine")
            .field("registry", &self.registry)
            .field("load_timeout", &self.load_timeout)
            .finish_non_exhaustive()
    }
}

impl NavigationEngine {
    /// Creates an engine that follows static `next` links on forward steps.
    #[must_use]
    pub fn new(
        registry: Arc<SessionRegistry>,
        loader: Arc<dyn StructureLoader>,
        publisher: Arc<dyn ContentSeenPublisher>,
        delivery: Arc<dyn DeliveryPort>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            loader,
            policy: Arc::new(FollowNextLink),
            publisher,
            delivery,
            clock,
            load_timeout: None,
        }
    }

    /// Replaces the policy used to choose the node after a forward step.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn NextNodePolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Bounds the structure loader call of a start. Registering the
    /// structure and delivering its first node are not bounded.
    #[must_use]
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = Some(timeout);
        self
    }

    /// The registry this engine navigates.
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Dispatches `command` on its kind.
    ///
    /// # Errors
    ///
    /// Returns whatever the handler for the command's kind returns.
    pub async fn handle(
        &self,
        command: &NavigationCommand,
    ) -> Result<NavigationOutcome, NavigationError> {
        match command.kind {
            NavigationKind::Start => self
                .handle_start_learning_object(command)
                .await
                .map(NavigationOutcome::Delivered),
            NavigationKind::Forward => self
                .handle_step_forward(command)
                .await
                .map(NavigationOutcome::Delivered),
            NavigationKind::Backward => self
                .handle_step_backward(command)
                .await
                .map(NavigationOutcome::Delivered),
            NavigationKind::First => self
                .handle_step_to_first_item(command)
                .await
                .map(NavigationOutcome::Delivered),
            NavigationKind::Finish => Ok(NavigationOutcome::Finished {
                removed: self.handle_finish_learning_object(command).await,
            }),
        }
    }

    /// Loads a fresh structure, starts it, registers it (replacing any
    /// previous one for the key), and delivers its first node.
    ///
    /// The loader runs before any lock is taken. The structure is then
    /// swapped into the key's slot under that slot's lock, which is held
    /// until the first node has been delivered. Requests already queued on
    /// the slot run before the swap; later ones see the new structure.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Load` if the loader fails,
    /// `NavigationError::LoadTimeout` if it exceeds the configured bound and
    /// `NavigationError::EmptyStructure` if the structure has no nodes. The
    /// registry is untouched in all three cases.
    pub async fn handle_start_learning_object(
        &self,
        command: &NavigationCommand,
    ) -> Result<DeliveredNode, NavigationError> {
        debug!(
            correlation_id = %command.correlation_id(),
            command_type = command.command_type(),
            key = %command.key(),
            "handling navigation command"
        );

        let mut structure = self.load(&command.process_id).await?;
        let step = structure.start()?;

        let mut slot = self.registry.lock_or_insert(&command.key()).await;
        if slot.replace(structure).is_some() {
            debug!(key = %command.key(), "replaced existing content structure");
        }

        let delivered = self.deliver(command, step).await;
        drop(slot);
        Ok(delivered)
    }

    /// Leaves the current node and delivers the one the policy picks.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::NoActiveSession` if nothing is registered
    /// for the key.
    pub async fn handle_step_forward(
        &self,
        command: &NavigationCommand,
    ) -> Result<DeliveredNode, NavigationError> {
        self.navigate(command, |structure| {
            structure.step_forward_with(self.policy.as_ref())
        })
        .await
    }

    /// Moves back one node and delivers it.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::NoActiveSession` if nothing is registered
    /// for the key.
    pub async fn handle_step_backward(
        &self,
        command: &NavigationCommand,
    ) -> Result<DeliveredNode, NavigationError> {
        self.navigate(command, ContentStructure::step_backward).await
    }

    /// Returns to the first node and delivers it.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::NoActiveSession` if nothing is registered
    /// for the key.
    pub async fn handle_step_to_first_item(
        &self,
        command: &NavigationCommand,
    ) -> Result<DeliveredNode, NavigationError> {
        self.navigate(command, ContentStructure::step_to_first).await
    }

    /// Drops the structure registered for the command's (session, process)
    /// key once navigation already in flight on it is done. Returns whether
    /// one was registered.
    pub async fn handle_finish_learning_object(&self, command: &NavigationCommand) -> bool {
        let removed = self
            .registry
            .remove(&command.session_id, &command.process_id)
            .await
            .is_some();
        info!(
            correlation_id = %command.correlation_id(),
            key = %command.key(),
            removed,
            "finished learning object"
        );
        removed
    }

    async fn navigate<F>(
        &self,
        command: &NavigationCommand,
        transition: F,
    ) -> Result<DeliveredNode, NavigationError>
    where
        F: FnOnce(&mut ContentStructure) -> Result<Step, NavigationError>,
    {
        debug!(
            correlation_id = %command.correlation_id(),
            command_type = command.command_type(),
            key = %command.key(),
            "handling navigation command"
        );

        let slot = self
            .registry
            .get(&command.session_id, &command.process_id)
            .ok_or_else(|| no_active_session(&command.session_id, &command.process_id))?;

        let mut guard = slot.lock().await;
        // Empty once a finish got the lock first.
        let structure = guard
            .as_mut()
            .ok_or_else(|| no_active_session(&command.session_id, &command.process_id))?;
        let step = transition(structure)?;
        if let Some(boundary) = step.boundary {
            debug!(?boundary, key = %command.key(), "navigation stopped at chain boundary");
        }

        let delivered = self.deliver(command, step).await;
        drop(guard);
        Ok(delivered)
    }

    async fn load(&self, process_id: &str) -> Result<ContentStructure, NavigationError> {
        let load = self.loader.load(process_id);
        let Some(timeout) = self.load_timeout else {
            return Ok(load.await?);
        };
        match tokio::time::timeout(timeout, load).await {
            Ok(loaded) => Ok(loaded?),
            Err(_) => {
                warn!(process_id, timeout_ms = %timeout.as_millis(), "structure load timed out");
                Err(NavigationError::LoadTimeout {
                    process_id: process_id.to_owned(),
                    timeout,
                })
            }
        }
    }

    async fn deliver(&self, command: &NavigationCommand, step: Step) -> DeliveredNode {
        let event = ContentSeenEvent::new(
            ContentSeen {
                content_id: step.node.id().to_owned(),
                session_id: command.session_id.clone(),
                token: command.token.clone(),
            },
            command.correlation_id(),
            self.clock.as_ref(),
        );
        let event_id = event.metadata.event_id;

        self.publisher.publish(event).await;
        self.delivery
            .deliver(DisplayCommand::for_node(&command.session_id, &step.node))
            .await;

        DeliveredNode {
            content_id: step.node.id().to_owned(),
            title: step.node.title().to_owned(),
            position: step.position,
            boundary: step.boundary,
            event_id,
        }
    }
}
