//! Execution context supplied by the host for each operation

use crate::slot::AccountId;
use serde::{Deserialize, Serialize};

/// Who is calling, and when.
///
/// The allocator ignores both fields; registries use `sender` for ownership
/// checks and `epoch` to stamp creation and update times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub sender: AccountId,
    pub epoch: u64,
}

impl ExecutionContext {
    pub fn new(sender: AccountId, epoch: u64) -> Self {
        Self { sender, epoch }
    }

    /// Same sender, later epoch
    pub fn at_epoch(&self, epoch: u64) -> Self {
        Self {
            sender: self.sender,
            epoch,
        }
    }
}
