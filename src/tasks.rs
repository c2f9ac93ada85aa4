// tasks.rs — self-terminating per-frame tasks

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Continue,
    Done,
}

/// Work that runs once per tick until it reports [`TaskStatus::Done`].
pub trait FrameTask {
    type Context;

    fn tick(&mut self, ctx: &mut Self::Context) -> TaskStatus;
}

/// A slot holding at most one scheduled task. Once the task reports `Done`
/// it is dropped, so nothing is left to schedule.
#[derive(Debug)]
pub struct TaskSlot<T> {
    task: Option<T>,
}

impl<T> Default for TaskSlot<T> {
    fn default() -> Self {
        Self { task: None }
    }
}

impl<T: FrameTask> TaskSlot<T> {
    /// Replaces whatever was scheduled.
    pub fn schedule(&mut self, task: T) {
        self.task = Some(task);
    }

    pub fn cancel(&mut self) {
        self.task = None;
    }

    pub fn is_scheduled(&self) -> bool {
        self.task.is_some()
    }

    /// Runs one tick. Returns `Continue` while the task stays scheduled.
    pub fn run(&mut self, ctx: &mut T::Context) -> TaskStatus {
        let Some(task) = self.task.as_mut() else {
            return TaskStatus::Done;
        };
        let status = task.tick(ctx);
        if status == TaskStatus::Done {
            self.task = None;
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown(u32);

    impl FrameTask for Countdown {
        type Context = Vec<u32>;

        fn tick(&mut self, seen: &mut Vec<u32>) -> TaskStatus {
            seen.push(self.0);
            if self.0 == 0 {
                return TaskStatus::Done;
            }
            self.0 -= 1;
            TaskStatus::Continue
        }
    }

    #[test]
    fn slot_drops_task_when_done() {
        let mut slot = TaskSlot::default();
        let mut seen = Vec::new();
        slot.schedule(Countdown(2));

        assert_eq!(slot.run(&mut seen), TaskStatus::Continue);
        assert_eq!(slot.run(&mut seen), TaskStatus::Continue);
        assert_eq!(slot.run(&mut seen), TaskStatus::Done);
        assert!(!slot.is_scheduled());

        // empty slot does no work
        assert_eq!(slot.run(&mut seen), TaskStatus::Done);
        assert_eq!(seen, vec![2, 1, 0]);
    }

    #[test]
    fn schedule_replaces_running_task() {
        let mut slot = TaskSlot::default();
        let mut seen = Vec::new();
        slot.schedule(Countdown(5));
        slot.run(&mut seen);
        slot.schedule(Countdown(0));
        assert_eq!(slot.run(&mut seen), TaskStatus::Done);
        assert_eq!(seen, vec![5, 0]);
    }
}
