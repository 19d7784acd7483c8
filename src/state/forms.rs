use poise::serenity_prelude::{ChannelId, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{BotError, Result};

/// Hours an accepted applicant must wait before reapplying
pub const DEFAULT_COOLDOWN_HOURS: u64 = 24;

/// A named application form: ordered questions plus routing metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDefinition {
    /// Questions asked over DM, in order (append-only)
    pub questions: Vec<String>,

    /// Channel where completed applications are posted for review
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelId>,

    /// Role granted on acceptance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleId>,

    /// Category the ticket channel is created under on acceptance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ChannelId>,

    /// Reapply cooldown in hours, armed on acceptance
    #[serde(default = "default_cooldown")]
    pub cooldown_hours: u64,
}

fn default_cooldown() -> u64 {
    DEFAULT_COOLDOWN_HOURS
}

impl Default for FormDefinition {
    fn default() -> Self {
        Self {
            questions: Vec::new(),
            channel: None,
            role: None,
            category: None,
            cooldown_hours: DEFAULT_COOLDOWN_HOURS,
        }
    }
}

/// All form definitions, keyed by form name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormRegistry {
    pub forms: HashMap<String, FormDefinition>,
}

impl FormRegistry {
    pub fn get(&self, name: &str) -> Option<&FormDefinition> {
        self.forms.get(name)
    }

    /// Create a new form; errors if the name is already taken
    pub fn create(&mut self, name: &str) -> Result<()> {
        if self.forms.contains_key(name) {
            return Err(BotError::FormExists {
                name: name.to_string(),
            });
        }
        self.forms
            .insert(name.to_string(), FormDefinition::default());
        Ok(())
    }

    /// Create or overwrite a form, resetting questions and settings
    pub fn recreate(&mut self, name: &str) {
        self.forms
            .insert(name.to_string(), FormDefinition::default());
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.forms
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| BotError::FormNotFound {
                name: name.to_string(),
            })
    }

    pub fn add_question(&mut self, name: &str, question: &str) -> Result<()> {
        self.get_mut(name)?.questions.push(question.to_string());
        Ok(())
    }

    pub fn set_role(&mut self, name: &str, role: RoleId) -> Result<()> {
        self.get_mut(name)?.role = Some(role);
        Ok(())
    }

    pub fn set_channel(&mut self, name: &str, channel: ChannelId) -> Result<()> {
        self.get_mut(name)?.channel = Some(channel);
        Ok(())
    }

    pub fn set_category(&mut self, name: &str, category: ChannelId) -> Result<()> {
        self.get_mut(name)?.category = Some(category);
        Ok(())
    }

    pub fn set_cooldown(&mut self, name: &str, hours: u64) -> Result<()> {
        self.get_mut(name)?.cooldown_hours = hours;
        Ok(())
    }

    pub fn form_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.forms.keys().cloned().collect();
        names.sort();
        names
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut FormDefinition> {
        self.forms
            .get_mut(name)
            .ok_or_else(|| BotError::FormNotFound {
                name: name.to_string(),
            })
    }
}
