//! Profiles and the username registry.

use blogchain_shared::types::{NewProfile, Page, PageRequest, Profile, ProfileUpdate};
use blogchain_shared::{BlogError, Result};

use crate::error::StoreError;
use crate::keys;
use crate::kv::StoreTx;

impl StoreTx<'_> {
    /// Register a profile and claim its username (case-folded).
    pub fn create_profile(&mut self, new: NewProfile, now: i64) -> Result<Profile> {
        let profile_key = keys::str_key(keys::PROFILES, &new.address);
        if self.has(&profile_key)? {
            return Err(BlogError::AlreadyExists(format!(
                "profile already exists for address {}",
                new.address
            )));
        }

        let username = new.username.to_lowercase();
        let username_key = keys::str_key(keys::USERNAMES, &username);
        if self.has(&username_key)? {
            return Err(BlogError::AlreadyExists(format!(
                "username {username} is already taken"
            )));
        }

        let profile = Profile {
            address: new.address,
            username,
            display_name: new.display_name,
            bio: new.bio,
            avatar_url: new.avatar_url,
            website: new.website,
            followers: 0,
            following: 0,
            post_count: 0,
            verified: false,
            created_at: now,
            updated_at: now,
        };

        self.set_record(&profile_key, &profile)?;
        self.set(&username_key, profile.address.as_bytes())?;

        tracing::info!(address = %profile.address, username = %profile.username, "profile created");
        Ok(profile)
    }

    pub fn get_profile(&self, address: &str) -> Result<Profile> {
        self.find_profile(address)?
            .ok_or_else(|| BlogError::NotFound(format!("profile not found for address {address}")))
    }

    pub(crate) fn find_profile(&self, address: &str) -> Result<Option<Profile>> {
        Ok(self.get_record(&keys::str_key(keys::PROFILES, address))?)
    }

    pub(crate) fn set_profile(&mut self, profile: &Profile) -> Result<()> {
        self.set_record(&keys::str_key(keys::PROFILES, &profile.address), profile)?;
        Ok(())
    }

    /// Case-insensitive lookup through the username registry.
    pub fn get_profile_by_username(&self, username: &str) -> Result<Profile> {
        let not_found = || BlogError::NotFound(format!("profile not found for username {username}"));

        let key = keys::str_key(keys::USERNAMES, &username.to_lowercase());
        let address = self.get(&key)?.ok_or_else(not_found)?;
        let address = String::from_utf8(address)
            .map_err(|_| BlogError::Storage(format!("username entry for {username} is not UTF-8")))?;

        self.get_profile(&address)
    }

    /// Overwrite the editable fields. The username never changes.
    pub fn update_profile(
        &mut self,
        address: &str,
        update: ProfileUpdate,
        now: i64,
    ) -> Result<Profile> {
        let mut profile = self.get_profile(address)?;
        profile.display_name = update.display_name;
        profile.bio = update.bio;
        profile.avatar_url = update.avatar_url;
        profile.website = update.website;
        profile.updated_at = now;
        self.set_profile(&profile)?;

        tracing::info!(address, "profile updated");
        Ok(profile)
    }

    /// Profiles in address order.
    pub fn list_profiles(&self, request: &PageRequest) -> Result<Page<Profile>> {
        let (entries, pagination) = self.page_prefix(keys::PROFILES, request)?;
        let items = entries
            .iter()
            .map(|(_, value)| bincode::deserialize(value))
            .collect::<std::result::Result<Vec<Profile>, _>>()
            .map_err(|e| BlogError::from(StoreError::from(e)))?;
        Ok(Page { items, pagination })
    }

    /// Bump the post counter of `address` if it has a profile.
    pub fn increment_post_count(&mut self, address: &str) -> Result<()> {
        if let Some(mut profile) = self.find_profile(address)? {
            profile.post_count += 1;
            self.set_profile(&profile)?;
        }
        Ok(())
    }

    /// Lower the post counter of `address` if it has a profile, never below zero.
    pub fn decrement_post_count(&mut self, address: &str) -> Result<()> {
        if let Some(mut profile) = self.find_profile(address)? {
            if profile.post_count > 0 {
                profile.post_count -= 1;
                self.set_profile(&profile)?;
            }
        }
        Ok(())
    }
}
