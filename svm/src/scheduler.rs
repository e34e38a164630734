//! Component E: round-robin cooperative task scheduler (§4.E, §5).
//! Tasks live in a flat `Vec`, addressed by the opaque [`TaskId`]
//! handle rather than by an intrusive linked-list pointer.

use tracing::debug;

use super::error::VmError;
use super::task::{Task, TaskConfig, TaskId};

pub struct Scheduler {
    tasks: Vec<Option<Task>>,
    current: usize,
    live_count: usize,
    switch_blocked: bool,
}

impl Scheduler {
    pub fn new(config: TaskConfig) -> Scheduler {
        Scheduler {
            tasks: vec![Some(Task::new(config))],
            current: 0,
            live_count: 1,
            switch_blocked: false,
        }
    }

    pub fn current_id(&self) -> TaskId {
        TaskId(self.current)
    }

    pub fn current(&self) -> &Task {
        self.tasks[self.current].as_ref().expect("current task is live")
    }

    pub fn current_mut(&mut self) -> &mut Task {
        self.tasks[self.current].as_mut().expect("current task is live")
    }

    pub fn get(&self, id: TaskId) -> Result<&Task, VmError> {
        self.tasks
            .get(id.0)
            .and_then(|t| t.as_ref())
            .ok_or(VmError::TaskNotFound)
    }

    pub fn set_switch_blocked(&mut self, blocked: bool) {
        self.switch_blocked = blocked;
    }

    pub fn switch_blocked(&self) -> bool {
        self.switch_blocked
    }

    pub fn task_count(&self) -> usize {
        self.live_count
    }

    /// Creates a new task, appended to the tail of the list (§4.E).
    pub fn task_create(&mut self, config: TaskConfig) -> TaskId {
        self.tasks.push(Some(Task::new(config)));
        self.live_count += 1;
        TaskId(self.tasks.len() - 1)
    }

    /// Unlinks and deallocates a task's buffers (§3, task lifecycle).
    /// Refuses to remove the last live task — a scheduler with no
    /// current task has nothing for `current()`/`current_mut()` to
    /// return, so that state is never allowed to exist.
    pub fn task_remove(&mut self, id: TaskId) -> Result<(), VmError> {
        let slot = self.tasks.get(id.0).ok_or(VmError::TaskNotFound)?;
        if slot.is_none() {
            return Err(VmError::TaskNotFound);
        }
        if self.live_count == 1 {
            return Err(VmError::NoLiveTasks);
        }
        self.tasks[id.0] = None;
        self.live_count -= 1;
        if self.current == id.0 {
            self.advance_to_next_live();
        }
        Ok(())
    }

    /// Advances `current` to the next live task, wrapping around the
    /// list. Fails with `TASK_SWITCH_BLOCKED` if switching is disabled.
    pub fn switch(&mut self) -> Result<TaskId, VmError> {
        if self.switch_blocked {
            return Err(VmError::TaskSwitchBlocked);
        }
        self.advance_to_next_live();
        debug!(task = self.current, "switched task");
        Ok(TaskId(self.current))
    }

    fn advance_to_next_live(&mut self) {
        let len = self.tasks.len();
        for step in 1..=len {
            let candidate = (self.current + step) % len;
            if self.tasks[candidate].is_some() {
                self.current = candidate;
                return;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn config() -> TaskConfig {
        TaskConfig {
            entry_pc: 0,
            call_stack_capacity: 4,
            data_stack_capacity: 4,
        }
    }

    #[test]
    fn create_then_round_robin_wraps() {
        let mut sched = Scheduler::new(config());
        let second = sched.task_create(config());
        let third = sched.task_create(config());
        assert_eq!(sched.task_count(), 3);

        assert_eq!(sched.switch().unwrap(), second);
        assert_eq!(sched.switch().unwrap(), third);
        // wraps back around to the task the scheduler started on.
        assert_eq!(sched.switch().unwrap(), TaskId(0));
    }

    #[test]
    fn switch_while_blocked_fails() {
        let mut sched = Scheduler::new(config());
        sched.task_create(config());
        sched.set_switch_blocked(true);
        assert_eq!(sched.switch(), Err(VmError::TaskSwitchBlocked));
        // current is untouched by the failed switch.
        assert_eq!(sched.current_id(), TaskId(0));
    }

    #[test]
    fn remove_current_task_advances_to_next_live() {
        let mut sched = Scheduler::new(config());
        let second = sched.task_create(config());
        sched.task_create(config());

        assert_eq!(sched.switch().unwrap(), second);
        sched.task_remove(second).unwrap();
        assert_eq!(sched.task_count(), 2);
        // removing the current task must leave `current` pointing at a
        // live slot, not the one just vacated.
        assert_eq!(sched.current_id(), TaskId(2));
    }

    #[test]
    fn remove_last_live_task_is_refused() {
        let mut sched = Scheduler::new(config());
        let only = sched.current_id();
        assert_eq!(sched.task_remove(only), Err(VmError::NoLiveTasks));
        assert_eq!(sched.task_count(), 1);
    }

    #[test]
    fn remove_unknown_task_fails() {
        let mut sched = Scheduler::new(config());
        assert_eq!(sched.task_remove(TaskId(9)), Err(VmError::TaskNotFound));
    }
}
