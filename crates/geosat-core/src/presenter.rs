//! Presentation Hooks
//!
//! The SDK never renders anything. Navigation requests, success alerts and
//! error messages are handed to a [`Presenter`] supplied by the front end.

use std::sync::{Mutex, PoisonError};

/// Screens the workflow can send the user to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    ImageRequest,
    ProcessImage,
    SatelliteMap,
    Settings,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::ImageRequest => "/image-request",
            Route::ProcessImage => "/process-image",
            Route::SatelliteMap => "/satellite-map",
            Route::Settings => "/settings",
        }
    }
}

/// Front-end callbacks
pub trait Presenter: Send + Sync {
    fn navigate(&self, route: Route);

    /// Success notification
    fn alert(&self, message: &str);

    fn error(&self, message: &str);
}

/// Discards every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn navigate(&self, _route: Route) {}
    fn alert(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Event captured by [`RecordingPresenter`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiEvent {
    Navigate(Route),
    Alert(String),
    Error(String),
}

/// Records every event in order (for tests and headless front ends)
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Navigate(route) => Some(route),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Error(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: UiEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl Presenter for RecordingPresenter {
    fn navigate(&self, route: Route) {
        self.record(UiEvent::Navigate(route));
    }

    fn alert(&self, message: &str) {
        self.record(UiEvent::Alert(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.record(UiEvent::Error(message.to_string()));
    }
}
