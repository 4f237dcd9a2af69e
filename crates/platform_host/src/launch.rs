//! App launch and task activation contract.

use std::{cell::RefCell, rc::Rc};

use shelf_contract::{AppIdentity, LaunchIntent, TaskId};

/// Host service that starts activities and brings tasks to front.
pub trait LaunchService {
    /// Starts the activity described by `intent`.
    fn launch(&self, intent: &LaunchIntent);

    /// Brings the task with `task_id` to front.
    fn activate_task(&self, task_id: TaskId) -> Result<(), String>;

    /// Offers a chooser between several running tasks of `app`.
    fn show_task_menu(&self, app: &AppIdentity, tasks: &[TaskId]);

    /// Tells the user that `app` can no longer be started.
    fn report_activity_not_found(&self, app: &AppIdentity);
}

#[derive(Debug, Clone, Copy, Default)]
/// Launch service that ignores every request.
pub struct NoopLaunchService;

impl LaunchService for NoopLaunchService {
    fn launch(&self, _intent: &LaunchIntent) {}

    fn activate_task(&self, _task_id: TaskId) -> Result<(), String> {
        Ok(())
    }

    fn show_task_menu(&self, _app: &AppIdentity, _tasks: &[TaskId]) {}

    fn report_activity_not_found(&self, _app: &AppIdentity) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request observed by [`RecordingLaunchService`].
pub enum LaunchRequest {
    /// An activity start.
    Launch(LaunchIntent),
    /// A task brought to front.
    ActivateTask(TaskId),
    /// A task chooser for an app.
    TaskMenu(AppIdentity, Vec<TaskId>),
    /// A not-found notice for an app.
    NotFound(AppIdentity),
}

#[derive(Debug, Clone, Default)]
/// Launch service that records requests in order.
pub struct RecordingLaunchService {
    requests: Rc<RefCell<Vec<LaunchRequest>>>,
}

impl RecordingLaunchService {
    /// Drains and returns the recorded requests.
    pub fn take_requests(&self) -> Vec<LaunchRequest> {
        std::mem::take(&mut *self.requests.borrow_mut())
    }
}

impl LaunchService for RecordingLaunchService {
    fn launch(&self, intent: &LaunchIntent) {
        self.requests
            .borrow_mut()
            .push(LaunchRequest::Launch(intent.clone()));
    }

    fn activate_task(&self, task_id: TaskId) -> Result<(), String> {
        self.requests
            .borrow_mut()
            .push(LaunchRequest::ActivateTask(task_id));
        Ok(())
    }

    fn show_task_menu(&self, app: &AppIdentity, tasks: &[TaskId]) {
        self.requests
            .borrow_mut()
            .push(LaunchRequest::TaskMenu(app.clone(), tasks.to_vec()));
    }

    fn report_activity_not_found(&self, app: &AppIdentity) {
        self.requests
            .borrow_mut()
            .push(LaunchRequest::NotFound(app.clone()));
    }
}
