//! Recording test doubles for the flow's collaborators

use crate::command::{CommandExecutor, ExecError};
use crate::identity::{IdentityError, IdentityResolver};
use crate::transport::{PublishError, PublishRequest, SignalPublisher};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Executor returning a canned exit code (or launch failure)
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    exit_code: i32,
    launch_fails: bool,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn exiting_with(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Default::default()
        }
    }

    pub fn failing_to_launch() -> Self {
        Self {
            launch_fails: true,
            ..Default::default()
        }
    }

    /// Sleep before answering, to simulate a long-running command
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn run(&self, command_line: &str) -> Result<i32, ExecError> {
        self.calls.lock().unwrap().push(command_line.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.launch_fails {
            return Err(ExecError::Launch {
                shell: "sh".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no shell"),
            });
        }
        Ok(self.exit_code)
    }
}

/// Resolver with canned answers and per-method call counters
#[derive(Debug, Default)]
pub struct RecordingResolver {
    instance_id: Option<String>,
    region: Option<String>,
    instance_id_calls: Mutex<usize>,
    region_calls: Mutex<usize>,
}

impl RecordingResolver {
    /// `None` makes the corresponding lookup fail
    pub fn new(instance_id: Option<&str>, region: Option<&str>) -> Self {
        Self {
            instance_id: instance_id.map(str::to_string),
            region: region.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn instance_id_calls(&self) -> usize {
        *self.instance_id_calls.lock().unwrap()
    }

    pub fn region_calls(&self) -> usize {
        *self.region_calls.lock().unwrap()
    }
}

#[async_trait]
impl IdentityResolver for RecordingResolver {
    async fn instance_id(&self) -> Result<String, IdentityError> {
        *self.instance_id_calls.lock().unwrap() += 1;
        self.instance_id.clone().ok_or(IdentityError::EmptyResponse {
            path: "instance-id".into(),
        })
    }

    async fn region(&self) -> Result<String, IdentityError> {
        *self.region_calls.lock().unwrap() += 1;
        self.region.clone().ok_or(IdentityError::EmptyResponse {
            path: "placement/region".into(),
        })
    }
}

/// How the recording publisher answers
#[derive(Debug, Clone, Default)]
pub enum PublishBehavior {
    #[default]
    Succeed,
    FailWith(String),
    TimeOut,
}

/// Publisher recording every request it receives
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    behavior: PublishBehavior,
    calls: Mutex<Vec<PublishRequest>>,
}

impl RecordingPublisher {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: PublishBehavior) -> Self {
        Self {
            behavior,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<PublishRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<PublishRequest> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SignalPublisher for RecordingPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<(), PublishError> {
        self.calls.lock().unwrap().push(request.clone());
        match &self.behavior {
            PublishBehavior::Succeed => Ok(()),
            PublishBehavior::FailWith(message) => Err(PublishError::Send(message.clone())),
            PublishBehavior::TimeOut => Err(PublishError::Timeout(request.publish_timeout)),
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
