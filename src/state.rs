use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::models::{CallSession, Roster};
use crate::services::ai::LlmProvider;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub roster: Roster,
    pub llm: Box<dyn LlmProvider>,
    pub sessions: Mutex<HashMap<String, CallSession>>,
}
