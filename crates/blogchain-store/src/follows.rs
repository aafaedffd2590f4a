//! Follow edges.
//!
//! Each edge is stored twice, `follows/(follower, following)` and
//! `followers/(following, follower)`, so both directions are prefix scans.

use blogchain_shared::{BlogError, Result};

use crate::keys;
use crate::kv::StoreTx;

impl StoreTx<'_> {
    pub fn follow(&mut self, follower: &str, following: &str) -> Result<()> {
        if follower == following {
            return Err(BlogError::InvalidArgument("cannot follow yourself".into()));
        }

        let mut follower_profile = self
            .get_profile(follower)
            .map_err(|e| e.context("follower profile"))?;
        let mut following_profile = self
            .get_profile(following)
            .map_err(|e| e.context("following profile"))?;

        let edge = keys::str_pair_key(keys::FOLLOWS, follower, following);
        if self.has(&edge)? {
            return Err(BlogError::AlreadyExists("already following this user".into()));
        }

        self.set_marker(&edge)?;
        self.set_marker(&keys::str_pair_key(keys::FOLLOWERS, following, follower))?;

        following_profile.followers += 1;
        follower_profile.following += 1;
        self.set_profile(&following_profile)?;
        self.set_profile(&follower_profile)?;

        tracing::info!(follower, following, "follow edge created");
        Ok(())
    }

    pub fn unfollow(&mut self, follower: &str, following: &str) -> Result<()> {
        if follower == following {
            return Err(BlogError::InvalidArgument("cannot unfollow yourself".into()));
        }

        let edge = keys::str_pair_key(keys::FOLLOWS, follower, following);
        if !self.delete(&edge)? {
            return Err(BlogError::NotFound("not following this user".into()));
        }
        self.delete(&keys::str_pair_key(keys::FOLLOWERS, following, follower))?;

        if let Some(mut profile) = self.find_profile(following)? {
            profile.followers = profile.followers.saturating_sub(1);
            self.set_profile(&profile)?;
        }
        if let Some(mut profile) = self.find_profile(follower)? {
            profile.following = profile.following.saturating_sub(1);
            self.set_profile(&profile)?;
        }

        tracing::info!(follower, following, "follow edge removed");
        Ok(())
    }

    pub fn is_following(&self, follower: &str, following: &str) -> Result<bool> {
        Ok(self.has(&keys::str_pair_key(keys::FOLLOWS, follower, following))?)
    }

    /// Addresses following `address`, in address order.
    pub fn get_followers(&self, address: &str) -> Result<Vec<String>> {
        self.edge_targets(keys::FOLLOWERS, address)
    }

    /// Addresses `address` follows, in address order.
    pub fn get_following(&self, address: &str) -> Result<Vec<String>> {
        self.edge_targets(keys::FOLLOWS, address)
    }

    fn edge_targets(&self, ns: &[u8], address: &str) -> Result<Vec<String>> {
        let prefix = keys::str_prefix(ns, address);
        self.keys_with_prefix(&prefix)?
            .iter()
            .map(|key| keys::trailing_str(key, &prefix).map_err(BlogError::from))
            .collect()
    }
}
