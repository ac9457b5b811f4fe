//! Shared component-profile store
//!
//! One map of logical component id to [`ComponentProfile`], shared between
//! the lifecycle profiler (writer), the leak trend analyzer (flagger) and
//! the diagnostic surface (reader). Mutation goes through this wrapper so
//! the eviction and leak-pinning rules live in one place.

use parking_lot::RwLock;
use perf_types::{ComponentProfile, LeakSeverity};
use std::collections::HashMap;

/// Process-wide profile map.
#[derive(Debug, Default)]
pub struct ProfileStore {
    profiles: RwLock<HashMap<String, ComponentProfile>>,
}

impl ProfileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or overwrite) a profile under its component id.
    pub fn insert(&self, profile: ComponentProfile) {
        self.profiles
            .write()
            .insert(profile.component_id.clone(), profile);
    }

    /// Close an open profile with its final memory figure.
    ///
    /// Returns the closed profile, or `None` when no open profile exists
    /// for the id (already closed or never started).
    pub fn close(&self, id: &str, final_memory: u64, now_ms: f64) -> Option<ComponentProfile> {
        let mut profiles = self.profiles.write();
        let profile = profiles.get_mut(id)?;
        if profile.is_closed() {
            return None;
        }
        profile.unmount_time_ms = Some(now_ms);
        profile.final_memory = Some(final_memory);
        profile.memory_delta = Some(final_memory as i64 - profile.initial_memory as i64);
        Some(profile.clone())
    }

    /// Flag a profile as a suspected leak, pinning it past eviction.
    ///
    /// Returns false when the profile no longer exists or is already
    /// flagged, so each profile is reported at most once.
    pub fn mark_leak(&self, id: &str, severity: LeakSeverity) -> bool {
        let mut profiles = self.profiles.write();
        match profiles.get_mut(id) {
            Some(profile) if !profile.is_leak => {
                profile.is_leak = true;
                profile.severity = Some(severity);
                true
            }
            _ => false,
        }
    }

    /// Fetch one profile by component id.
    pub fn get(&self, id: &str) -> Option<ComponentProfile> {
        self.profiles.read().get(id).cloned()
    }

    /// Snapshot of all tracked profiles.
    pub fn all(&self) -> Vec<ComponentProfile> {
        self.profiles.read().values().cloned().collect()
    }

    /// Profiles currently flagged as suspected leaks.
    pub fn flagged(&self) -> Vec<ComponentProfile> {
        self.profiles
            .read()
            .values()
            .filter(|p| p.is_leak)
            .cloned()
            .collect()
    }

    /// Remove a profile whose retention window elapsed.
    ///
    /// Only removes when the entry is still the same closed cycle
    /// (`unmount_time_ms` matches) and was never flagged as a leak, so a
    /// remount or a late leak flag cancels the eviction.
    pub fn remove_if_expired(&self, id: &str, closed_at_ms: f64) -> bool {
        let mut profiles = self.profiles.write();
        let expired = matches!(
            profiles.get(id),
            Some(p) if p.unmount_time_ms == Some(closed_at_ms) && !p.is_leak
        );
        if expired {
            profiles.remove(id);
        }
        expired
    }

    /// Drop every profile.
    pub fn clear(&self) {
        self.profiles.write().clear();
    }

    /// Number of tracked profiles.
    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}
