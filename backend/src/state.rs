// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    events::EventBus,
    repositories::{
        AdminRepository, QuizRepository, ResultRepository, SubscriptionRepository, UserRepository,
    },
    services::session::SessionRegistry,
    store::DocumentStore,
};

/// Shared application state, handed to every handler through `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub events: EventBus,
    pub quizzes: Arc<QuizRepository>,
    pub results: Arc<ResultRepository>,
    pub admins: Arc<AdminRepository>,
    pub subscriptions: Arc<SubscriptionRepository>,
    pub users: Arc<UserRepository>,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Wires every repository onto one store and one event bus.
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        let events = EventBus::new();
        Self {
            quizzes: Arc::new(QuizRepository::new(store.clone(), events.clone())),
            results: Arc::new(ResultRepository::new(store.clone(), events.clone())),
            admins: Arc::new(AdminRepository::new(store.clone(), events.clone())),
            subscriptions: Arc::new(SubscriptionRepository::new(store.clone(), events.clone())),
            users: Arc::new(UserRepository::new(store)),
            sessions: SessionRegistry::new(),
            config,
            events,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
