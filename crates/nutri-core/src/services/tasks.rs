//! Personal task lists stored in each user document.

use serde_json::json;

use super::{fields, log_store_error, log_validation_error, ServiceError, ServiceResult};
use crate::config::CoreConfig;
use crate::models::{Task, UserProfile};
use crate::store::{Collection, DocumentStore, StoreError};
use crate::validation;

const USER: &str = "user";
const TASK: &str = "task";

pub struct TaskService<'a> {
    users: Collection<'a, UserProfile>,
}

impl<'a> TaskService<'a> {
    pub fn new(store: &'a dyn DocumentStore, config: &'a CoreConfig) -> Self {
        Self {
            users: Collection::new(store, config.users_collection()),
        }
    }

    pub fn list_tasks(&self, user_id: &str) -> ServiceResult<Vec<Task>> {
        Ok(self.require_user(user_id)?.tasks)
    }

    /// Tasks whose title contains `query`, ignoring case. A blank query lists every task.
    pub fn search_tasks(&self, user_id: &str, query: &str) -> ServiceResult<Vec<Task>> {
        let query = query.trim();
        let mut tasks = self.list_tasks(user_id)?;
        if !query.is_empty() {
            tasks.retain(|t| t.title_matches(query));
        }
        Ok(tasks)
    }

    pub fn add_task(&self, user_id: &str, title: &str, description: &str) -> ServiceResult<Task> {
        let task = Task::new(title.trim().to_string(), description.trim().to_string())
            .map_err(log_validation_error("add_task"))?;

        let mut tasks = self.list_tasks(user_id)?;
        tasks.push(task.clone());
        self.write_tasks(user_id, &tasks, "add_task")?;
        Ok(task)
    }

    /// Replace a task's title, description and state.
    pub fn update_task(&self, user_id: &str, task: &Task) -> ServiceResult<Task> {
        validation::require(&task.title, "title").map_err(log_validation_error("update_task"))?;

        let mut tasks = self.list_tasks(user_id)?;
        let slot = tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| ServiceError::not_found(TASK, task.id.as_str()))?;
        *slot = task.clone();

        self.write_tasks(user_id, &tasks, "update_task")?;
        Ok(task.clone())
    }

    /// Flip a task's completed flag.
    pub fn toggle_task(&self, user_id: &str, task_id: &str) -> ServiceResult<Task> {
        let mut tasks = self.list_tasks(user_id)?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| ServiceError::not_found(TASK, task_id))?;
        task.completed = !task.completed;
        let toggled = task.clone();

        self.write_tasks(user_id, &tasks, "toggle_task")?;
        Ok(toggled)
    }

    pub fn delete_task(&self, user_id: &str, task_id: &str) -> ServiceResult<Task> {
        let mut tasks = self.list_tasks(user_id)?;
        let index = tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| ServiceError::not_found(TASK, task_id))?;
        let removed = tasks.remove(index);

        self.write_tasks(user_id, &tasks, "delete_task")?;
        Ok(removed)
    }

    fn require_user(&self, user_id: &str) -> ServiceResult<UserProfile> {
        self.users
            .get(user_id)
            .map_err(log_store_error("load_user"))?
            .ok_or_else(|| ServiceError::not_found(USER, user_id))
    }

    fn write_tasks(&self, user_id: &str, tasks: &[Task], operation: &'static str) -> ServiceResult<()> {
        match self.users.update_fields(user_id, fields(json!({ "tareas": tasks }))) {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound { .. }) => Err(ServiceError::not_found(USER, user_id)),
            Err(e) => Err(log_store_error(operation)(e)),
        }
    }
}
