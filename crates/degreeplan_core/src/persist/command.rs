//! Persistence commands and the one-way queue that carries them.
//!
//! # Responsibility
//! - Describe every remote write the engine can request.
//! - Hand commands off without waiting for, or branching on, the outcome.
//!
//! # Invariants
//! - `Create`/`Update` always carry a non-empty, ordered course sequence.
//! - A closed queue never surfaces as an error to the engine; the dropped
//!   command is logged and in-memory state stays authoritative.
//! - Ordering between commands is not part of the contract.

use crate::model::course::CourseId;
use log::{debug, error};
use std::sync::mpsc::{self, Receiver, Sender};
use uuid::Uuid;

/// Planner account identifier.
pub type UserId = Uuid;

/// One remote write for a `(user_id, semester_index)` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistCommand {
    /// Semester went from zero members to one or more.
    Create {
        user_id: UserId,
        semester_index: usize,
        course_ids: Vec<CourseId>,
    },
    /// Non-empty semester changed and is still non-empty.
    Update {
        user_id: UserId,
        semester_index: usize,
        course_ids: Vec<CourseId>,
    },
    /// Semester became empty.
    Delete {
        user_id: UserId,
        semester_index: usize,
    },
}

impl PersistCommand {
    /// Stable label used in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    pub fn semester_index(&self) -> usize {
        match self {
            Self::Create { semester_index, .. }
            | Self::Update { semester_index, .. }
            | Self::Delete { semester_index, .. } => *semester_index,
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            Self::Create { user_id, .. }
            | Self::Update { user_id, .. }
            | Self::Delete { user_id, .. } => *user_id,
        }
    }
}

/// Sending half of the persistence queue.
#[derive(Debug, Clone)]
pub struct PersistQueue {
    sender: Sender<PersistCommand>,
}

/// Creates a connected queue and the receiver a worker drains.
pub fn persist_channel() -> (PersistQueue, Receiver<PersistCommand>) {
    let (sender, receiver) = mpsc::channel();
    (PersistQueue { sender }, receiver)
}

impl PersistQueue {
    /// Enqueues one command. Fire-and-forget.
    pub fn enqueue(&self, command: PersistCommand) {
        let kind = command.kind();
        let semester_index = command.semester_index();
        match self.sender.send(command) {
            Ok(()) => debug!(
                "event=persist_enqueue module=persist status=ok kind={} semester_index={}",
                kind, semester_index
            ),
            Err(_) => error!(
                "event=persist_enqueue module=persist status=error kind={} semester_index={} error_code=queue_closed",
                kind, semester_index
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{persist_channel, PersistCommand};
    use uuid::Uuid;

    #[test]
    fn enqueue_delivers_commands_in_send_order() {
        let (queue, receiver) = persist_channel();
        let user_id = Uuid::new_v4();
        queue.enqueue(PersistCommand::Delete {
            user_id,
            semester_index: 3,
        });
        queue.enqueue(PersistCommand::Delete {
            user_id,
            semester_index: 1,
        });

        let indexes: Vec<usize> = receiver
            .try_iter()
            .map(|command| command.semester_index())
            .collect();
        assert_eq!(indexes, vec![3, 1]);
    }

    #[test]
    fn enqueue_on_closed_queue_does_not_panic() {
        let (queue, receiver) = persist_channel();
        drop(receiver);
        queue.enqueue(PersistCommand::Delete {
            user_id: Uuid::new_v4(),
            semester_index: 0,
        });
    }
}
