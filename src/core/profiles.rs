use crate::domain::model::{Profile, ProfileMap};
use crate::utils::error::{Result, TrackerError};
use crate::utils::validation::validate_profile_name;

/// Named spool templates keyed by trimmed name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileStore {
    profiles: ProfileMap,
}

impl ProfileStore {
    pub fn new(profiles: ProfileMap) -> Self {
        Self { profiles }
    }

    pub fn profiles(&self) -> &ProfileMap {
        &self.profiles
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name.trim())
    }

    /// Create-or-replace. Returns the full mapping afterwards.
    pub fn save_profile(&mut self, name: &str, profile: Profile) -> Result<&ProfileMap> {
        let name = validate_profile_name(name)?;
        if !profile.spool_capacity_g.is_finite() || profile.spool_capacity_g < 0.0 {
            return Err(TrackerError::invalid_field(
                "spool_capacity_g",
                "must be a finite number >= 0",
            ));
        }

        self.profiles.insert(name, profile);
        Ok(&self.profiles)
    }

    /// 刪除不存在的名稱不算錯誤；回傳值表示是否真的有變動
    pub fn delete_profile(&mut self, name: &str) -> Result<bool> {
        let name = validate_profile_name(name)?;
        Ok(self.profiles.remove(&name).is_some())
    }
}
