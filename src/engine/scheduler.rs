use log::debug;

use crate::config::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    AutoFish,
    AutoSell,
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::AutoFish => "auto-fish",
            TaskKind::AutoSell => "auto-sell",
        }
    }
}

struct Task {
    kind: TaskKind,
    last_run: i64,
    interval: i64,
    active: bool,
}

/// Recurring game timers. Polled with the current time; a task that is
/// overdue fires once and restarts its interval from the poll time, so a long
/// stall never produces a burst of catch-up runs.
pub struct TickScheduler {
    tasks: Vec<Task>,
}

impl TickScheduler {
    pub fn new(config: &SessionConfig, now_ms: i64) -> Self {
        let tasks = vec![
            Task {
                kind: TaskKind::AutoFish,
                last_run: now_ms,
                interval: config.auto_fish_secs as i64 * 1000,
                active: false,
            },
            Task {
                kind: TaskKind::AutoSell,
                last_run: now_ms,
                interval: config.auto_sell_secs as i64 * 1000,
                active: false,
            },
        ];
        Self { tasks }
    }

    fn task_mut(&mut self, kind: TaskKind) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.kind == kind)
    }

    pub fn is_active(&self, kind: TaskKind) -> bool {
        self.tasks.iter().any(|t| t.kind == kind && t.active)
    }

    pub fn set_active(&mut self, kind: TaskKind, active: bool, now_ms: i64) {
        if let Some(task) = self.task_mut(kind) {
            if active && !task.active {
                task.last_run = now_ms;
                debug!("Scheduling {} every {}ms", kind.name(), task.interval);
            }
            task.active = active;
        }
    }

    pub fn reset(&mut self, kind: TaskKind, now_ms: i64) {
        if let Some(task) = self.task_mut(kind) {
            task.last_run = now_ms;
        }
    }

    pub fn due_in(&self, kind: TaskKind, now_ms: i64) -> Option<i64> {
        self.tasks
            .iter()
            .find(|t| t.kind == kind && t.active)
            .map(|t| (t.last_run + t.interval - now_ms).max(0))
    }

    pub fn poll(&mut self, now_ms: i64) -> Vec<TaskKind> {
        let mut due = Vec::new();
        for task in &mut self.tasks {
            if task.last_run > now_ms {
                task.last_run = now_ms; // Clock went backwards
            }
            if task.active && now_ms - task.last_run >= task.interval {
                task.last_run = now_ms;
                due.push(task.kind);
            }
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> TickScheduler {
        TickScheduler::new(&SessionConfig::default(), 0)
    }

    #[test]
    fn test_inactive_tasks_never_fire() {
        let mut s = scheduler();
        assert!(s.poll(60_000).is_empty());
    }

    #[test]
    fn test_fires_on_interval() {
        let mut s = scheduler();
        s.set_active(TaskKind::AutoFish, true, 0);
        assert!(s.poll(4_999).is_empty());
        assert_eq!(s.poll(5_000), vec![TaskKind::AutoFish]);
        assert!(s.poll(9_999).is_empty());
        assert_eq!(s.poll(10_000), vec![TaskKind::AutoFish]);
    }

    #[test]
    fn test_late_poll_fires_once() {
        let mut s = scheduler();
        s.set_active(TaskKind::AutoFish, true, 0);
        s.set_active(TaskKind::AutoSell, true, 0);
        assert_eq!(s.poll(60_000), vec![TaskKind::AutoFish, TaskKind::AutoSell]);
        assert!(s.poll(60_001).is_empty());
        assert_eq!(s.due_in(TaskKind::AutoFish, 61_000), Some(4_000));
    }

    #[test]
    fn test_reset_restarts_interval() {
        let mut s = scheduler();
        s.set_active(TaskKind::AutoFish, true, 0);
        s.reset(TaskKind::AutoFish, 4_000);
        assert!(s.poll(5_000).is_empty());
        assert_eq!(s.poll(9_000), vec![TaskKind::AutoFish]);
    }

    #[test]
    fn test_deactivate_stops_task() {
        let mut s = scheduler();
        s.set_active(TaskKind::AutoSell, true, 0);
        s.set_active(TaskKind::AutoSell, false, 1_000);
        assert!(s.poll(30_000).is_empty());
        assert_eq!(s.due_in(TaskKind::AutoSell, 30_000), None);
    }
}
