//! Async tasks.
//!
//! There is one interpreter loop and no preemption. Calling an `async`
//! function captures the call as a pending task and returns a handle at
//! once. The task body runs later, either when something `await`s the
//! handle or when `execute` drains the queue after the program finishes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::rc::Rc;

use corp_ir::Name;

use crate::exception::ExceptionObject;
use crate::interpreter::{ArgValue, MethodReceiver};
use crate::value::Closure;
use crate::Value;

/// A call captured for later execution.
pub(crate) struct PendingCall {
    pub closure: Rc<Closure>,
    pub receiver: Option<MethodReceiver>,
    pub args: Vec<ArgValue>,
}

enum TaskState {
    Pending(PendingCall),
    Running,
    Done(Value),
    Failed(Rc<ExceptionObject>),
}

/// What an `await` finds when it looks at a task.
pub(crate) enum TaskPoll {
    /// Not started; the caller must run it now. The task is marked running.
    Start(PendingCall),
    /// Already running further up the stack.
    Running,
    Done(Value),
    Failed(Rc<ExceptionObject>),
}

/// Handle to a scheduled unit of work.
pub struct TaskHandle {
    id: u64,
    name: Name,
    state: RefCell<TaskState>,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Name of the async function the task runs.
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            *self.state.borrow(),
            TaskState::Done(_) | TaskState::Failed(_)
        )
    }

    pub(crate) fn poll(&self) -> TaskPoll {
        let mut state = self.state.borrow_mut();
        match mem::replace(&mut *state, TaskState::Running) {
            TaskState::Pending(call) => TaskPoll::Start(call),
            TaskState::Running => TaskPoll::Running,
            TaskState::Done(value) => {
                *state = TaskState::Done(value.clone());
                TaskPoll::Done(value)
            }
            TaskState::Failed(exc) => {
                *state = TaskState::Failed(Rc::clone(&exc));
                TaskPoll::Failed(exc)
            }
        }
    }

    pub(crate) fn complete(&self, outcome: Result<Value, Rc<ExceptionObject>>) {
        *self.state.borrow_mut() = match outcome {
            Ok(value) => TaskState::Done(value),
            Err(exc) => TaskState::Failed(exc),
        };
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// FIFO of scheduled tasks.
#[derive(Default)]
pub(crate) struct TaskQueue {
    queue: VecDeque<Rc<TaskHandle>>,
    next_id: u64,
}

impl TaskQueue {
    pub fn spawn(&mut self, call: PendingCall) -> Rc<TaskHandle> {
        self.next_id += 1;
        let task = Rc::new(TaskHandle {
            id: self.next_id,
            name: call.closure.qualified_name.clone(),
            state: RefCell::new(TaskState::Pending(call)),
        });
        self.queue.push_back(Rc::clone(&task));
        task
    }

    pub fn pop_front(&mut self) -> Option<Rc<TaskHandle>> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
