//! Query scheduling: inline or on a background thread.
//!
//! Both coordinators drive the same [`CollisionDetector`] and speak the
//! same task protocol, so callers pick an execution mode once and keep an
//! identical contract: submissions never block on resolution, replies are
//! collected with [`CollisionCoordinator::poll_replies`] in submission
//! order, and submitting before INIT is an error in either mode.

use std::collections::VecDeque;
use std::thread;

use crossbeam::channel::{unbounded, Receiver, Sender, TryRecvError};
use log::{debug, info, trace};

use crate::config::CollisionConfig;
use crate::foundation::time::Stopwatch;

use super::detector::CollisionDetector;
use super::protocol::{
    CollisionError, CollisionReply, CollisionRequest, CollisionTask, TaskReply, UpdatePayload,
};
use super::COLLISIONS_EPSILON;

/// Scheduling seam between callers and the collision detector.
pub trait CollisionCoordinator {
    /// Submit an INIT task, allocating a fresh snapshot cache
    fn init(&mut self) -> Result<(), CollisionError>;

    /// Submit an UPDATE task carrying snapshots to upsert
    fn update(&mut self, payload: UpdatePayload) -> Result<(), CollisionError>;

    /// Submit one COLLIDE query for resolution
    fn collide(&mut self, request: CollisionRequest) -> Result<(), CollisionError>;

    /// Collect every reply finished so far, oldest first
    fn poll_replies(&mut self) -> Result<Vec<CollisionReply>, CollisionError>;
}

/// Runs every task synchronously on the caller's thread.
///
/// Replies still arrive through [`CollisionCoordinator::poll_replies`] so
/// call sites stay mode-agnostic; with this coordinator they are simply
/// complete by the time `collide` returns.
pub struct InlineCoordinator {
    detector: CollisionDetector,
    pending: VecDeque<CollisionReply>,
}

impl Default for InlineCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl InlineCoordinator {
    /// Creates an inline coordinator with the default contact offset.
    pub fn new() -> Self {
        Self::with_epsilon(COLLISIONS_EPSILON)
    }

    /// Creates an inline coordinator with a custom contact offset.
    pub fn with_epsilon(collisions_epsilon: f32) -> Self {
        Self {
            detector: CollisionDetector::with_epsilon(collisions_epsilon),
            pending: VecDeque::new(),
        }
    }
}

impl CollisionCoordinator for InlineCoordinator {
    fn init(&mut self) -> Result<(), CollisionError> {
        self.detector.on_init();
        Ok(())
    }

    fn update(&mut self, payload: UpdatePayload) -> Result<(), CollisionError> {
        self.detector.on_update(payload)
    }

    fn collide(&mut self, request: CollisionRequest) -> Result<(), CollisionError> {
        let reply = self.detector.on_collide(&request)?;
        self.pending.push_back(reply);
        Ok(())
    }

    fn poll_replies(&mut self) -> Result<Vec<CollisionReply>, CollisionError> {
        Ok(self.pending.drain(..).collect())
    }
}

/// Runs the detector on a dedicated background thread.
///
/// Tasks travel over an unbounded channel in submission order and replies
/// come back the same way, so several queries can be in flight at once;
/// the correlation id ties each reply to its request. Dropping the
/// coordinator closes the task channel and joins the thread.
pub struct ChannelCoordinator {
    tasks: Option<Sender<CollisionTask>>,
    replies: Receiver<TaskReply>,
    handle: Option<thread::JoinHandle<()>>,
    initialized: bool,
}

impl Default for ChannelCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelCoordinator {
    /// Spawns the resolution thread with the default contact offset.
    pub fn new() -> Self {
        Self::with_epsilon(COLLISIONS_EPSILON)
    }

    /// Spawns the resolution thread with a custom contact offset.
    pub fn with_epsilon(collisions_epsilon: f32) -> Self {
        let (task_sender, task_receiver) = unbounded::<CollisionTask>();
        let (reply_sender, reply_receiver) = unbounded::<TaskReply>();

        let handle = thread::spawn(move || {
            let mut detector = CollisionDetector::with_epsilon(collisions_epsilon);
            debug!("collision worker thread started");
            loop {
                match task_receiver.recv() {
                    Ok(task) => {
                        let timing = matches!(task, CollisionTask::Collide(_))
                            .then(Stopwatch::start_new);
                        let reply = detector.process(task);
                        if let Some(stopwatch) = timing {
                            debug!(
                                "collision query resolved in {:.3} ms",
                                stopwatch.elapsed_millis()
                            );
                        }
                        if reply_sender.send(reply).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            debug!("collision worker thread stopped");
        });

        Self {
            tasks: Some(task_sender),
            replies: reply_receiver,
            handle: Some(handle),
            initialized: false,
        }
    }

    fn send(&self, task: CollisionTask) -> Result<(), CollisionError> {
        self.tasks
            .as_ref()
            .ok_or(CollisionError::WorkerDisconnected)?
            .send(task)
            .map_err(|_| CollisionError::WorkerDisconnected)
    }
}

impl CollisionCoordinator for ChannelCoordinator {
    fn init(&mut self) -> Result<(), CollisionError> {
        self.send(CollisionTask::Init)?;
        self.initialized = true;
        Ok(())
    }

    fn update(&mut self, payload: UpdatePayload) -> Result<(), CollisionError> {
        if !self.initialized {
            return Err(CollisionError::NotInitialized { operation: "update" });
        }
        self.send(CollisionTask::Update(payload))
    }

    fn collide(&mut self, request: CollisionRequest) -> Result<(), CollisionError> {
        if !self.initialized {
            return Err(CollisionError::NotInitialized { operation: "collide" });
        }
        self.send(CollisionTask::Collide(request))
    }

    fn poll_replies(&mut self) -> Result<Vec<CollisionReply>, CollisionError> {
        let mut replies = Vec::new();
        loop {
            match self.replies.try_recv() {
                Ok(TaskReply::InitAck(status)) => {
                    status?;
                    trace!("init acknowledged");
                }
                Ok(TaskReply::UpdateAck(status)) => {
                    status?;
                    trace!("update acknowledged");
                }
                Ok(TaskReply::CollideReply(result)) => replies.push(result?),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(CollisionError::WorkerDisconnected)
                }
            }
        }
        Ok(replies)
    }
}

impl Drop for ChannelCoordinator {
    fn drop(&mut self) {
        // Closing the task channel ends the thread's recv loop
        self.tasks.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Picks the execution mode the configuration asks for.
pub fn coordinator_from_config(config: &CollisionConfig) -> Box<dyn CollisionCoordinator> {
    if config.use_worker {
        info!("collision coordinator: background worker");
        Box::new(ChannelCoordinator::with_epsilon(config.collisions_epsilon))
    } else {
        info!("collision coordinator: inline");
        Box::new(InlineCoordinator::with_epsilon(config.collisions_epsilon))
    }
}
