//! Router hook used to send the user back to the login screen

use std::sync::Mutex;

/// The application's router, as seen by the session layer
pub trait Navigator: Send + Sync {
    /// Route currently displayed, e.g. `/transfers/new`
    fn current_route(&self) -> String;

    /// Navigate to `route`
    fn redirect(&self, route: &str);
}

/// Navigator for headless use; never moves
#[derive(Debug, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_route(&self) -> String {
        String::new()
    }

    fn redirect(&self, _route: &str) {}
}

/// Navigator that only tracks the current route in memory
#[derive(Debug)]
pub struct MemoryNavigator {
    route: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: Mutex::new(route.into()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Simulate the user moving to another screen
    pub fn visit(&self, route: impl Into<String>) {
        if let Ok(mut current) = self.route.lock() {
            *current = route.into();
        }
    }

    /// Redirects issued so far, oldest first
    pub fn redirects(&self) -> Vec<String> {
        self.history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }
}

impl Navigator for MemoryNavigator {
    fn current_route(&self) -> String {
        self.route
            .lock()
            .map(|route| route.clone())
            .unwrap_or_default()
    }

    fn redirect(&self, route: &str) {
        if let Ok(mut history) = self.history.lock() {
            history.push(route.to_string());
        }
        self.visit(route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_navigator_records_redirects() {
        let navigator = MemoryNavigator::new("/dashboard");
        navigator.redirect("/login");

        assert_eq!(navigator.current_route(), "/login");
        assert_eq!(navigator.redirects(), vec!["/login".to_string()]);
    }
}
