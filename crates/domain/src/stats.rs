use crate::task::{Task, TaskStatus};
use serde::{Deserialize, Serialize};

/// `/api/tasks/stats` のレスポンス
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total_tasks: u64,
    pub pending_tasks: u64,
    pub in_progress_tasks: u64,
    pub completed_tasks: u64,
    pub cancelled_tasks: u64,
}

impl TaskStats {
    /// 取得済みのタスク一覧から集計する
    pub fn from_tasks(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut stats, task| {
            stats.total_tasks += 1;
            match task.status {
                TaskStatus::Pending => stats.pending_tasks += 1,
                TaskStatus::InProgress => stats.in_progress_tasks += 1,
                TaskStatus::Completed => stats.completed_tasks += 1,
                TaskStatus::Cancelled => stats.cancelled_tasks += 1,
            }
            stats
        })
    }

    pub fn count(&self, status: TaskStatus) -> u64 {
        match status {
            TaskStatus::Pending => self.pending_tasks,
            TaskStatus::InProgress => self.in_progress_tasks,
            TaskStatus::Completed => self.completed_tasks,
            TaskStatus::Cancelled => self.cancelled_tasks,
        }
    }
}
