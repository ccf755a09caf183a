use std::env;

#[derive(Clone)]
pub struct Config {
    pub mongo_uri: String,
    pub database_name: String,
    pub bind_addr: String,
    pub frontend_origin: String,
    /// Whether a user replace also re-stamps `assignedUserName` on tasks that
    /// reference the user but are missing from its `pendingTasks` list.
    pub restamp_drifted_tasks: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let restamp_drifted_tasks = env::var("RESTAMP_DRIFTED_TASKS")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        Self {
            mongo_uri: env::var("MONGO_URI").expect("MONGO_URI must be set"),
            database_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "task_db".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            frontend_origin: env::var("FRONTEND_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            restamp_drifted_tasks,
        }
    }
}
