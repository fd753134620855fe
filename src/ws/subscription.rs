//! Per-connection subscription manager.
//!
//! Tracks which content tables a WebSocket client is subscribed to and
//! provides server-side event filtering.

use std::collections::HashSet;

/// Tables whose changes the feed announces.
pub const CONTENT_TABLES: [&str; 7] = [
    "fuel_prices",
    "contact_info",
    "job_listings",
    "news",
    "services",
    "team_members",
    "site_settings",
];

/// Manages the set of table subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed tables. If `subscribe_all` is true, this set is ignored.
    tables: HashSet<&'static str>,
    /// Whether the client subscribes to all tables (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds tables to the subscription set. `"*"` enables the wildcard.
    /// Returns the names that were not recognised.
    pub fn subscribe(&mut self, names: &[String]) -> Vec<String> {
        let mut unknown = Vec::new();
        for name in names {
            if name == "*" {
                self.subscribe_all = true;
            } else if let Some(table) = known_table(name) {
                self.tables.insert(table);
            } else {
                unknown.push(name.clone());
            }
        }
        unknown
    }

    /// Removes tables from the subscription set. `"*"` clears everything.
    pub fn unsubscribe(&mut self, names: &[String]) {
        for name in names {
            if name == "*" {
                self.subscribe_all = false;
                self.tables.clear();
            } else if let Some(table) = known_table(name) {
                self.tables.remove(table);
            }
        }
    }

    /// Returns `true` if events for `table` should be forwarded.
    #[must_use]
    pub fn matches(&self, table: &str) -> bool {
        self.subscribe_all || self.tables.contains(table)
    }

    /// Returns the explicitly subscribed tables, sorted.
    #[must_use]
    pub fn tables(&self) -> Vec<&'static str> {
        let mut tables: Vec<_> = self.tables.iter().copied().collect();
        tables.sort_unstable();
        tables
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

fn known_table(name: &str) -> Option<&'static str> {
    CONTENT_TABLES.into_iter().find(|t| *t == name)
}
