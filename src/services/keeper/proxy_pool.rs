// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::{DEFAULT_PROXY_SCHEME, PROXY_SCHEMES};
use alloy::primitives::Address;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct PoolState {
    cursor: usize,
    assignments: HashMap<Address, String>,
}

/// Round-robin proxy assignment shared by every account.
///
/// Assignments are sticky: an account keeps its proxy until [`ProxyPool::rotate`]
/// moves it on. A single cursor is shared by all accounts and advances by one on
/// every new assignment or rotation.
#[derive(Debug, Default)]
pub struct ProxyPool {
    entries: Vec<String>,
    state: Mutex<PoolState>,
}

impl ProxyPool {
    pub fn new(entries: Vec<String>) -> Self {
        Self {
            entries,
            state: Mutex::new(PoolState::default()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn normalize(uri: &str) -> String {
        if PROXY_SCHEMES.iter().any(|scheme| uri.starts_with(scheme)) {
            uri.to_string()
        } else {
            format!("{DEFAULT_PROXY_SCHEME}{uri}")
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current sticky proxy for `address`, assigning the next one on first use.
    pub fn assign(&self, address: Address) -> Option<String> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = state.assignments.get(&address) {
            return Some(existing.clone());
        }
        self.take_next(&mut state, address)
    }

    /// Move `address` to the next proxy regardless of its current assignment.
    pub fn rotate(&self, address: Address) -> Option<String> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.take_next(&mut state, address)
    }

    pub fn current(&self, address: Address) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.assignments.get(&address).cloned()
    }

    fn take_next(&self, state: &mut PoolState, address: Address) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let proxy = Self::normalize(&self.entries[state.cursor]);
        state.cursor = (state.cursor + 1) % self.entries.len();
        state.assignments.insert(address, proxy.clone());
        Some(proxy)
    }
}
