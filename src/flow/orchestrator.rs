//! Orchestration flow - sequences executor, resolver and publisher

use crate::command::CommandExecutor;
use crate::config::{SignalConfig, StatusSource};
use crate::identity::{IdentityError, IdentityResolver};
use crate::transport::{PublishError, PublishRequest, SignalPublisher};
use std::future::Future;
use std::sync::Arc;
use tcsignal_shared::{
    exit_code,
    state_machine::{FlowEvent, FlowMachine, FlowState, TransitionResult},
    SignalMessage, Status,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Fatal errors. The signal was not (or may not have been) delivered.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("failed to get instance ID: {0}")]
    InstanceId(#[source] IdentityError),

    #[error("failed to publish signal: {0}")]
    Publish(#[source] PublishError),

    #[error("operation cancelled during {stage}: overall timeout elapsed")]
    Cancelled { stage: FlowState },
}

impl FlowError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        exit_code::INFRA_FAILURE
    }
}

/// Result of a run whose signal was published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Status that was published
    pub status: Status,
    /// The command failed; exit with the command-failed code
    pub should_exit_early: bool,
    /// Code the process returns
    pub exit_code: i32,
    /// Instance ID that was published
    pub instance_id: String,
    /// Region hint handed to the publisher (may be empty)
    pub region: String,
}

/// Runs one signal dispatch
pub struct SignalFlow {
    executor: Arc<dyn CommandExecutor>,
    resolver: Arc<dyn IdentityResolver>,
    publisher: Arc<dyn SignalPublisher>,
}

impl SignalFlow {
    /// Create a new flow over the given collaborators
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        resolver: Arc<dyn IdentityResolver>,
        publisher: Arc<dyn SignalPublisher>,
    ) -> Self {
        Self {
            executor,
            resolver,
            publisher,
        }
    }

    /// Run the flow to completion.
    ///
    /// `cancel` is the overall-timeout scope; every stage gives up as soon as
    /// it fires.
    pub async fn run(
        &self,
        config: &SignalConfig,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, FlowError> {
        let mut fsm = FlowMachine::new();
        let result = self.run_stages(config, cancel, &mut fsm).await;

        if let Err(e) = &result {
            advance(
                &mut fsm,
                FlowEvent::Failed {
                    reason: e.to_string(),
                },
            );
        }

        result
    }

    async fn run_stages(
        &self,
        config: &SignalConfig,
        cancel: &CancellationToken,
        fsm: &mut FlowMachine,
    ) -> Result<RunOutcome, FlowError> {
        advance(fsm, FlowEvent::Begin);
        let (status, should_exit_early) = self.determine_status(config, cancel).await?;

        advance(fsm, FlowEvent::StatusDetermined);
        let instance_id = self.resolve_instance_id(config, cancel).await?;
        let region = self.resolve_region(config, cancel).await?;

        advance(fsm, FlowEvent::IdentityResolved);
        let request = PublishRequest {
            queue_url: config.queue_url.clone(),
            signal: SignalMessage::new(config.signal_id.clone(), instance_id.clone(), status),
            region: region.clone(),
            publish_timeout: config.publish_timeout,
            retries: config.retries,
        };

        debug!("Publishing via {}", self.publisher.name());
        cancellable(cancel, FlowState::Publish, self.publisher.publish(&request))
            .await?
            .map_err(FlowError::Publish)?;

        advance(fsm, FlowEvent::Published);
        info!(
            "Successfully published signal: status={}, signal_id={}, instance_id={}",
            status, config.signal_id, instance_id
        );

        let exit_code = if should_exit_early {
            exit_code::COMMAND_FAILED
        } else {
            exit_code::OK
        };

        Ok(RunOutcome {
            status,
            should_exit_early,
            exit_code,
            instance_id,
            region,
        })
    }

    /// Returns the status and whether the command failed
    async fn determine_status(
        &self,
        config: &SignalConfig,
        cancel: &CancellationToken,
    ) -> Result<(Status, bool), FlowError> {
        let command = match &config.source {
            StatusSource::Explicit(status) => {
                // Explicit FAILURE is not a command failure and exits 0
                info!("Using explicit status {}", status);
                return Ok((*status, false));
            }
            StatusSource::Exec(command) => command,
        };

        info!("Running command: {}", command);
        let result = cancellable(
            cancel,
            FlowState::DetermineStatus,
            self.executor.run(command),
        )
        .await?;

        match result {
            Ok(code) => match Status::from_exit_code(code) {
                Status::Success => {
                    info!("Command succeeded");
                    Ok((Status::Success, false))
                }
                Status::Failure => {
                    warn!("Command exited with code {}", code);
                    Ok((Status::Failure, true))
                }
            },
            Err(e) => {
                warn!("Command execution failed: {}", e);
                Ok((Status::Failure, true))
            }
        }
    }

    async fn resolve_instance_id(
        &self,
        config: &SignalConfig,
        cancel: &CancellationToken,
    ) -> Result<String, FlowError> {
        if let Some(instance_id) = &config.instance_id_override {
            debug!("Using provided instance ID {}", instance_id);
            return Ok(instance_id.clone());
        }

        let instance_id = cancellable(
            cancel,
            FlowState::ResolveIdentity,
            self.resolver.instance_id(),
        )
        .await?
        .map_err(FlowError::InstanceId)?;

        debug!("Resolved instance ID {}", instance_id);
        Ok(instance_id)
    }

    /// Region failures fall back to an empty hint
    async fn resolve_region(
        &self,
        config: &SignalConfig,
        cancel: &CancellationToken,
    ) -> Result<String, FlowError> {
        if let Some(region) = &config.region_override {
            debug!("Using provided region {}", region);
            return Ok(region.clone());
        }

        match cancellable(cancel, FlowState::ResolveIdentity, self.resolver.region()).await? {
            Ok(region) => {
                debug!("Resolved region {}", region);
                Ok(region)
            }
            Err(e) => {
                warn!(
                    "Failed to get region from instance metadata, using default configuration: {}",
                    e
                );
                Ok(String::new())
            }
        }
    }
}

/// Race `fut` against the overall cancellation scope
async fn cancellable<T>(
    cancel: &CancellationToken,
    stage: FlowState,
    fut: impl Future<Output = T>,
) -> Result<T, FlowError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FlowError::Cancelled { stage }),
        out = fut => Ok(out),
    }
}

fn advance(fsm: &mut FlowMachine, event: FlowEvent) {
    let from = fsm.state();
    match fsm.process_event(event) {
        TransitionResult::Advanced(to) => debug!("[FLOW] {} -> {}", from, to),
        TransitionResult::Aborted { from, reason } => {
            debug!("[FLOW] Aborted during {}: {}", from, reason)
        }
        TransitionResult::Invalid { from, event } => {
            error!("[FLOW] Invalid transition from {} on {:?}", from, event)
        }
    }
}
