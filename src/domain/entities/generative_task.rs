use crate::ports::image_generation_port::{ProviderTaskStatus, TaskUpdate};

/// Status of an asynchronous generative task.
///
/// `Submitted` is the initial state, `Pending` covers every still-processing
/// status the provider may report, and the four remaining states are terminal.
/// `TimedOut` is never reported by the provider: the poller imposes it when
/// the polling budget is exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Submitted,
    Pending,
    Succeeded,
    Failed,
    Unknown,
    TimedOut,
}

impl TaskStatus {
    /// No further transition happens once a task is in a terminal status
    pub fn is_terminal(&self) -> bool {
        match self {
            TaskStatus::Succeeded
            | TaskStatus::Failed
            | TaskStatus::Unknown
            | TaskStatus::TimedOut => true,
            TaskStatus::Submitted | TaskStatus::Pending => false,
        }
    }
}

/// A generative task as tracked by the poller, from submission to its
/// terminal status.
///
/// Mutated only by provider poll responses (`record`) and by the poller's own
/// timeout (`time_out`).
#[derive(Debug, Clone)]
pub struct GenerativeTask {
    /// Opaque identity issued by the provider on submission
    pub task_id: String,
    pub status: TaskStatus,
    /// URL of the generated image, present only once `Succeeded`
    pub result_ref: Option<String>,
    /// Message reported by the provider on a terminal failure
    pub failure_message: Option<String>,
}

impl GenerativeTask {
    pub fn submitted(task_id: String) -> Self {
        Self {
            task_id,
            status: TaskStatus::Submitted,
            result_ref: None,
            failure_message: None,
        }
    }

    /// Records one poll response from the provider
    pub fn record(&mut self, update: &TaskUpdate) {
        self.status = match update.status {
            ProviderTaskStatus::Pending => TaskStatus::Pending,
            ProviderTaskStatus::Succeeded => TaskStatus::Succeeded,
            ProviderTaskStatus::Failed => TaskStatus::Failed,
            ProviderTaskStatus::Unknown => TaskStatus::Unknown,
        };
        self.result_ref = update.result_url.clone();
        self.failure_message = update.message.clone();
    }

    /// Imposed by the poller when the polling budget is exhausted
    pub fn time_out(&mut self) {
        self.status = TaskStatus::TimedOut;
    }
}
