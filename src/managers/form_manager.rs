use poise::serenity_prelude::{ChannelId, RoleId};
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::state::{FormDefinition, FormRegistry, JsonStore};

/// Shared form registry document
pub type SharedFormStore = Arc<JsonStore<FormRegistry>>;

/// CRUD over form definitions; every mutation persists the full registry
/// before acknowledging
pub struct FormManager {
    store: SharedFormStore,
}

impl FormManager {
    pub fn new(store: SharedFormStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, name: &str) -> Result<()> {
        self.store.update(|registry| registry.create(name)).await?;
        info!("Form '{}' created", name);
        Ok(())
    }

    pub async fn recreate(&self, name: &str) -> Result<()> {
        self.store
            .update(|registry| {
                registry.recreate(name);
                Ok(())
            })
            .await?;
        info!("Form '{}' recreated", name);
        Ok(())
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.store.update(|registry| registry.delete(name)).await?;
        info!("Form '{}' deleted", name);
        Ok(())
    }

    pub async fn add_question(&self, name: &str, question: &str) -> Result<()> {
        self.store
            .update(|registry| registry.add_question(name, question))
            .await
    }

    pub async fn set_role(&self, name: &str, role: RoleId) -> Result<()> {
        self.store
            .update(|registry| registry.set_role(name, role))
            .await
    }

    pub async fn set_channel(&self, name: &str, channel: ChannelId) -> Result<()> {
        self.store
            .update(|registry| registry.set_channel(name, channel))
            .await
    }

    pub async fn set_category(&self, name: &str, category: ChannelId) -> Result<()> {
        self.store
            .update(|registry| registry.set_category(name, category))
            .await
    }

    pub async fn set_cooldown(&self, name: &str, hours: u64) -> Result<()> {
        self.store
            .update(|registry| registry.set_cooldown(name, hours))
            .await
    }

    pub async fn get(&self, name: &str) -> Option<FormDefinition> {
        self.store
            .read(|registry| registry.get(name).cloned())
            .await
    }

    pub async fn form_names(&self) -> Vec<String> {
        self.store.read(|registry| registry.form_names()).await
    }
}

/// Shared form manager type
pub type SharedFormManager = Arc<FormManager>;

pub fn create_shared_form_manager(store: SharedFormStore) -> SharedFormManager {
    Arc::new(FormManager::new(store))
}
