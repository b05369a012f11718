//! Scripted reader for tests.
//!
//! All state sits behind a shared handle so a test can keep steering the
//! reader after handing it to a supervisor or poller.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::ReaderError;
use crate::reader::{ElementBounds, ReaderPort, WindowHealth};

#[derive(Debug)]
pub struct MockState {
    /// Results for upcoming connect() calls; empty means success.
    pub connect_results: VecDeque<Result<(), ReaderError>>,
    pub health: Result<WindowHealth, ReaderError>,
    pub child_count: usize,
    pub texts: HashMap<usize, String>,
    pub bounds: HashMap<usize, ElementBounds>,
    pub window_bounds: Option<ElementBounds>,
    /// Fail every text read with this error
    pub read_error: Option<ReaderError>,
    /// Fail every restore with this error
    pub restore_error: Option<ReaderError>,
    pub connected: bool,
    pub connect_calls: usize,
    pub health_calls: usize,
    pub restore_calls: usize,
    pub disconnect_calls: usize,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            connect_results: VecDeque::new(),
            health: Ok(WindowHealth::Alive),
            child_count: 200,
            texts: HashMap::new(),
            bounds: HashMap::new(),
            window_bounds: None,
            read_error: None,
            restore_error: None,
            connected: false,
            connect_calls: 0,
            health_calls: 0,
            restore_calls: 0,
            disconnect_calls: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockReader {
    state: Arc<Mutex<MockState>>,
}

impl MockReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Put `(artist, title)` into the elements of a deck layout.
    pub fn set_deck(&self, title_element: usize, artist_element: usize, artist: &str, title: &str) {
        let mut state = self.state();
        state.texts.insert(title_element, title.to_string());
        state.texts.insert(artist_element, artist.to_string());
    }

    pub fn fail_connects(&self, count: usize, error: ReaderError) {
        let mut state = self.state();
        for _ in 0..count {
            state.connect_results.push_back(Err(error.clone()));
        }
    }
}

impl ReaderPort for MockReader {
    fn connect(&mut self) -> Result<(), ReaderError> {
        let mut state = self.state();
        state.connect_calls += 1;
        let result = state.connect_results.pop_front().unwrap_or(Ok(()));
        state.connected = result.is_ok();
        result
    }

    fn check_health(&mut self) -> Result<WindowHealth, ReaderError> {
        let mut state = self.state();
        state.health_calls += 1;
        if !state.connected {
            return Err(ReaderError::NotConnected);
        }
        if state.health.is_err() {
            state.connected = false;
        }
        state.health.clone()
    }

    fn restore(&mut self) -> Result<(), ReaderError> {
        let mut state = self.state();
        state.restore_calls += 1;
        if let Some(error) = &state.restore_error {
            return Err(error.clone());
        }
        if state.health == Ok(WindowHealth::Minimized) {
            state.health = Ok(WindowHealth::Alive);
        }
        Ok(())
    }

    fn child_count(&mut self) -> Result<usize, ReaderError> {
        let state = self.state();
        if !state.connected {
            return Err(ReaderError::NotConnected);
        }
        Ok(state.child_count)
    }

    fn text_at(&mut self, index: usize) -> Result<String, ReaderError> {
        let state = self.state();
        if !state.connected {
            return Err(ReaderError::NotConnected);
        }
        if let Some(error) = &state.read_error {
            return Err(error.clone());
        }
        Ok(state.texts.get(&index).cloned().unwrap_or_default())
    }

    fn window_bounds(&mut self) -> Result<Option<ElementBounds>, ReaderError> {
        Ok(self.state().window_bounds)
    }

    fn bounds_at(&mut self, index: usize) -> Result<Option<ElementBounds>, ReaderError> {
        Ok(self.state().bounds.get(&index).copied())
    }

    fn disconnect(&mut self) {
        let mut state = self.state();
        state.disconnect_calls += 1;
        state.connected = false;
    }
}
