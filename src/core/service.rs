use crate::core::extractor::{UsageExtractor, UsageLookup};
use crate::core::profiles::ProfileStore;
use crate::core::spool::Consumption;
use crate::domain::model::{
    HostEvent, JobCompletion, PersistedSettings, Profile, ProfileMap, SpoolSnapshot, SpoolState,
};
use crate::domain::ports::{Authorizer, FileResolver, NotificationSink, SettingsStore};
use crate::utils::error::{Result, TrackerError};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Full view returned by `GET state`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateView {
    #[serde(flatten)]
    pub spool: SpoolSnapshot,
    pub profiles: ProfileMap,
}

#[derive(Debug)]
struct TrackerState {
    spool: SpoolState,
    profiles: ProfileStore,
}

/// Owns the active spool and the profile mapping.
///
/// Every read and mutation goes through one lock, and the durable mirror is written
/// before the in-memory state is replaced, so a failed save leaves both unchanged.
pub struct AccountingService {
    state: Mutex<TrackerState>,
    store: Arc<dyn SettingsStore>,
    sink: Arc<dyn NotificationSink>,
    authorizer: Arc<dyn Authorizer>,
    resolver: Arc<dyn FileResolver>,
    extractor: UsageExtractor,
}

impl AccountingService {
    /// 啟動時載入持久化設定；第一次使用時以預設值建立
    pub async fn init(
        store: Arc<dyn SettingsStore>,
        sink: Arc<dyn NotificationSink>,
        authorizer: Arc<dyn Authorizer>,
        resolver: Arc<dyn FileResolver>,
        extractor: UsageExtractor,
    ) -> Result<Self> {
        let settings = match store.load().await? {
            Some(settings) => settings,
            None => {
                tracing::info!("No saved spool settings, starting from defaults");
                PersistedSettings::default()
            }
        };
        let (spool, profiles) = settings.into_parts();

        tracing::debug!(
            "Loaded spool: {:.2}g of {:.2}g {} ({} profiles)",
            spool.remaining_g,
            spool.capacity_g,
            spool.filament_type,
            profiles.len()
        );

        Ok(Self {
            state: Mutex::new(TrackerState {
                spool,
                profiles: ProfileStore::new(profiles),
            }),
            store,
            sink,
            authorizer,
            resolver,
            extractor,
        })
    }

    pub fn authorizer(&self) -> &dyn Authorizer {
        self.authorizer.as_ref()
    }

    pub async fn snapshot(&self) -> SpoolSnapshot {
        self.state.lock().await.spool.snapshot()
    }

    pub async fn profiles(&self) -> ProfileMap {
        self.state.lock().await.profiles.profiles().clone()
    }

    pub async fn state_view(&self) -> StateView {
        let state = self.state.lock().await;
        StateView {
            spool: state.spool.snapshot(),
            profiles: state.profiles.profiles().clone(),
        }
    }

    async fn persist(&self, spool: &SpoolState, profiles: &ProfileMap) -> Result<()> {
        self.store
            .save(&PersistedSettings::from_parts(spool, profiles))
            .await
    }

    pub async fn load_new_spool(
        &self,
        capacity_g: f64,
        filament_type: &str,
        color: &str,
        manufacturer: &str,
    ) -> Result<SpoolSnapshot> {
        let mut state = self.state.lock().await;
        self.load_spool_locked(&mut state, capacity_g, filament_type, color, manufacturer)
            .await
    }

    /// 呼叫端必須持有鎖
    async fn load_spool_locked(
        &self,
        state: &mut TrackerState,
        capacity_g: f64,
        filament_type: &str,
        color: &str,
        manufacturer: &str,
    ) -> Result<SpoolSnapshot> {
        let mut spool = state.spool.clone();
        if let Err(e) = spool.load_new_spool(capacity_g, filament_type, color, manufacturer) {
            tracing::error!("Invalid spool capacity: {}", capacity_g);
            return Err(e);
        }

        self.persist(&spool, state.profiles.profiles()).await?;
        state.spool = spool;

        tracing::info!(
            "✅ Loaded new spool: {:.2}g {} {} {}",
            capacity_g,
            filament_type,
            color,
            manufacturer
        );
        self.sink.publish(&state.spool.loaded_change());

        Ok(state.spool.snapshot())
    }

    /// Loads a new spool from a stored profile, exactly as `load_new_spool` would.
    ///
    /// The lookup and the load happen under one lock acquisition.
    pub async fn apply_profile(&self, name: &str) -> Result<(String, Profile)> {
        let name = crate::utils::validation::validate_profile_name(name)?;
        let mut state = self.state.lock().await;

        let profile = state
            .profiles
            .get(&name)
            .cloned()
            .ok_or_else(|| TrackerError::ProfileNotFound { name: name.clone() })?;

        self.load_spool_locked(
            &mut state,
            profile.spool_capacity_g,
            &profile.filament_type,
            &profile.color,
            &profile.manufacturer,
        )
        .await?;

        tracing::info!("Applied profile '{}'", name);
        Ok((name, profile))
    }

    /// Deducts `used_g` from the active spool. `Ok(None)` when nothing changed.
    pub async fn apply_consumption(&self, used_g: f64) -> Result<Option<Consumption>> {
        let mut state = self.state.lock().await;

        let mut spool = state.spool.clone();
        let Some(step) = spool.apply_consumption(used_g) else {
            tracing::debug!("Ignoring non-positive usage: {}", used_g);
            return Ok(None);
        };

        tracing::info!(
            "Updating remaining filament: {:.2}g - {:.2}g = {:.2}g",
            step.prior_g,
            step.used_g,
            step.new_g
        );

        self.persist(&spool, state.profiles.profiles()).await?;
        state.spool = spool;
        self.sink.publish(&state.spool.consumed_change());

        Ok(Some(step))
    }

    pub async fn save_profile(&self, name: &str, profile: Profile) -> Result<ProfileMap> {
        let mut state = self.state.lock().await;

        let mut profiles = state.profiles.clone();
        profiles.save_profile(name, profile)?;

        self.persist(&state.spool, profiles.profiles()).await?;
        state.profiles = profiles;

        tracing::info!("Saved profile '{}'", name.trim());
        Ok(state.profiles.profiles().clone())
    }

    pub async fn delete_profile(&self, name: &str) -> Result<ProfileMap> {
        let mut state = self.state.lock().await;

        let mut profiles = state.profiles.clone();
        if profiles.delete_profile(name)? {
            self.persist(&state.spool, profiles.profiles()).await?;
            state.profiles = profiles;
            tracing::info!("Deleted profile '{}'", name.trim());
        } else {
            tracing::debug!("Profile '{}' does not exist, nothing to delete", name.trim());
        }

        Ok(state.profiles.profiles().clone())
    }

    /// 列印完成事件：解析用量並扣除。任何錯誤只記錄，不向上拋出
    pub async fn on_job_completed(&self, job: &JobCompletion) -> Option<Consumption> {
        let path = match self.resolver.path_on_disk(&job.origin, &job.path) {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("Error processing print completion: {}", e);
                return None;
            }
        };

        let used_g = match self.extractor.extract(&path).await {
            UsageLookup::Found(grams) if grams > 0.0 => grams,
            UsageLookup::Found(grams) => {
                tracing::debug!("Usage {}g recorded for {}, nothing to deduct", grams, job.path);
                return None;
            }
            UsageLookup::NotFound => return None,
        };

        match self.apply_consumption(used_g).await {
            Ok(step) => step,
            Err(e) => {
                tracing::error!("Error processing print completion: {}", e);
                None
            }
        }
    }

    /// Only successful completions are accounted; other host events are ignored.
    pub async fn handle_host_event(&self, event: &HostEvent) -> Option<Consumption> {
        if !event.is_print_done() {
            tracing::debug!("Ignoring host event {}", event.event);
            return None;
        }

        match serde_json::from_value::<JobCompletion>(event.payload.clone()) {
            Ok(job) => self.on_job_completed(&job).await,
            Err(e) => {
                tracing::error!("Malformed {} payload: {}", event.event, e);
                None
            }
        }
    }

    /// Writes the current state to the store, used at shutdown.
    pub async fn flush(&self) -> Result<()> {
        let state = self.state.lock().await;
        self.persist(&state.spool, state.profiles.profiles()).await?;
        tracing::debug!("Spool settings flushed");
        Ok(())
    }
}
