// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-job log sink.

use tracing::info;

/// Receives human-readable lines destined for a job's output log.
pub trait TaskLogger: Send + Sync {
    fn log(&self, line: &str);
}

/// Forwards task log lines to `tracing`, tagged with the task id.
#[derive(Debug, Clone)]
pub struct TracingTaskLogger {
    task_id: u64,
}

impl TracingTaskLogger {
    pub fn new(task_id: u64) -> Self {
        Self { task_id }
    }
}

impl TaskLogger for TracingTaskLogger {
    fn log(&self, line: &str) {
        info!(task_id = self.task_id, "{line}");
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[test]
    #[traced_test]
    fn tracing_logger_tags_task_id() {
        let logger = TracingTaskLogger::new(42);
        logger.log("ssh agent started");
        assert!(logs_contain("ssh agent started"));
        assert!(logs_contain("task_id=42"));
    }
}
