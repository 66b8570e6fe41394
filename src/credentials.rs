use heapless::Vec;

use crate::config::MAX_NETWORKS;
use crate::error::ConfigError;
use crate::profile::NetworkProfile;

/// Ordered network profiles with a cursor that only moves forward, wrapping.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    profiles: Vec<NetworkProfile, MAX_NETWORKS>,
    current: usize,
}

impl CredentialStore {
    pub fn single(profile: NetworkProfile) -> Self {
        let mut profiles = Vec::new();
        // Capacity is at least one, so the first push cannot fail.
        let _ = profiles.push(profile);
        Self {
            profiles,
            current: 0,
        }
    }

    pub fn from_list(profiles: &[NetworkProfile], start: usize) -> Result<Self, ConfigError> {
        let mut store = Self::single(NetworkProfile::default());
        store.replace_list(profiles, start)?;
        Ok(store)
    }

    pub fn current(&self) -> &NetworkProfile {
        &self.profiles[self.current]
    }

    pub(crate) fn current_mut(&mut self) -> &mut NetworkProfile {
        &mut self.profiles[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NetworkProfile> {
        self.profiles.get(index)
    }

    /// Moves to the next profile, wrapping to the first. Returns the new index.
    pub fn advance(&mut self) -> usize {
        self.current = (self.current + 1) % self.profiles.len();
        self.current
    }

    pub fn replace(&mut self, profile: NetworkProfile) {
        *self = Self::single(profile);
    }

    /// Installs a new list. Every profile must pass
    /// [`NetworkProfile::validate`], since hopping may land on any of them.
    /// On error the store is left as it was.
    pub fn replace_list(
        &mut self,
        profiles: &[NetworkProfile],
        start: usize,
    ) -> Result<(), ConfigError> {
        if profiles.is_empty() {
            return Err(ConfigError::NoNetworks);
        }
        if start >= profiles.len() {
            return Err(ConfigError::StartIndexOutOfRange {
                index: start,
                len: profiles.len(),
            });
        }
        for profile in profiles {
            profile.validate()?;
        }
        let profiles = Vec::from_slice(profiles).map_err(|_| ConfigError::TooManyNetworks)?;
        self.profiles = profiles;
        self.current = start;
        Ok(())
    }
}
