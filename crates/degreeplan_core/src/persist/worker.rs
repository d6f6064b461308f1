//! Background worker that drains the persistence queue into a repository.
//!
//! # Responsibility
//! - Apply queued commands to the assignment store, one at a time.
//! - Log every failure. Nothing is retried and nothing is rolled back.
//!
//! # Invariants
//! - The worker stops once every `PersistQueue` clone is dropped.
//! - A store that cannot be opened turns every command into a logged failure.

use crate::db::open_db;
use crate::persist::command::PersistCommand;
use crate::repo::assignment_repo::{AssignmentRepository, SqliteAssignmentRepository};
use crate::repo::RepoResult;
use log::{debug, error, info};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

const WORKER_THREAD_NAME: &str = "degreeplan-persist";

/// Counters reported when a worker finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistStats {
    pub applied: usize,
    pub failed: usize,
}

/// Applies one command to `repo` and logs the outcome.
pub fn apply_command<R: AssignmentRepository>(
    repo: &R,
    command: &PersistCommand,
) -> RepoResult<()> {
    let result = match command {
        PersistCommand::Create {
            user_id,
            semester_index,
            course_ids,
        } => repo.create_assignment(*user_id, *semester_index, course_ids),
        PersistCommand::Update {
            user_id,
            semester_index,
            course_ids,
        } => repo.update_assignment(*user_id, *semester_index, course_ids),
        PersistCommand::Delete {
            user_id,
            semester_index,
        } => repo.delete_assignment(*user_id, *semester_index),
    };

    match &result {
        Ok(()) => debug!(
            "event=persist_apply module=persist status=ok kind={} semester_index={}",
            command.kind(),
            command.semester_index()
        ),
        Err(err) => error!(
            "event=persist_apply module=persist status=error kind={} semester_index={} error={}",
            command.kind(),
            command.semester_index(),
            err
        ),
    }
    result
}

/// Applies commands until the queue disconnects.
pub fn drain_commands<R: AssignmentRepository>(
    repo: &R,
    receiver: &Receiver<PersistCommand>,
) -> PersistStats {
    let mut stats = PersistStats::default();
    for command in receiver.iter() {
        match apply_command(repo, &command) {
            Ok(()) => stats.applied += 1,
            Err(_) => stats.failed += 1,
        }
    }
    stats
}

/// Handle to the background persistence thread.
pub struct PersistWorker {
    handle: JoinHandle<PersistStats>,
}

impl PersistWorker {
    /// Spawns a worker that opens its own connection to `db_path`.
    pub fn spawn(db_path: PathBuf, receiver: Receiver<PersistCommand>) -> std::io::Result<Self> {
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(db_path, receiver))?;
        Ok(Self { handle })
    }

    /// Waits for the queue to drain and the thread to exit.
    pub fn join(self) -> PersistStats {
        match self.handle.join() {
            Ok(stats) => stats,
            Err(_) => {
                error!(
                    "event=persist_worker module=persist status=error error_code=worker_panicked"
                );
                PersistStats::default()
            }
        }
    }
}

fn run_worker(db_path: PathBuf, receiver: Receiver<PersistCommand>) -> PersistStats {
    info!(
        "event=persist_worker module=persist status=start db_path={}",
        db_path.display()
    );
    let conn = match open_db(&db_path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=persist_worker module=persist status=error error_code=db_open_failed error={}",
                err
            );
            return discard_all(&receiver);
        }
    };
    let stats = match SqliteAssignmentRepository::try_new(&conn) {
        Ok(repo) => drain_commands(&repo, &receiver),
        Err(err) => {
            error!(
                "event=persist_worker module=persist status=error error_code=repo_init_failed error={}",
                err
            );
            discard_all(&receiver)
        }
    };
    info!(
        "event=persist_worker module=persist status=stop applied={} failed={}",
        stats.applied, stats.failed
    );
    stats
}

fn discard_all(receiver: &Receiver<PersistCommand>) -> PersistStats {
    let mut stats = PersistStats::default();
    for command in receiver.iter() {
        error!(
            "event=persist_apply module=persist status=error kind={} semester_index={} error_code=store_unavailable",
            command.kind(),
            command.semester_index()
        );
        stats.failed += 1;
    }
    stats
}
