use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    // Store errors
    #[error("Failed to load store file '{path}': {source}")]
    StoreLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse store file '{path}': {source}")]
    StoreParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to save store file '{path}': {source}")]
    StoreSave {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // Form registry errors
    #[error("Form not found: '{name}'")]
    FormNotFound { name: String },

    #[error("Form already exists: '{name}' (use recreateform to overwrite)")]
    FormExists { name: String },

    #[error("Form '{name}' has no questions yet")]
    FormHasNoQuestions { name: String },

    #[error("Form '{name}' has no submission channel configured")]
    ChannelNotConfigured { name: String },

    #[error("Form '{name}' has no accepted role configured")]
    RoleNotConfigured { name: String },

    #[error("Form '{name}' has no ticket category configured")]
    CategoryNotConfigured { name: String },

    // Review errors
    #[error("No pending application for user {user_id}")]
    ApplicationNotFound { user_id: String },

    #[error("Role not found: {id}")]
    RoleNotFound { id: String },

    #[error("Member not found in guild: {user_id}")]
    MemberNotFound { user_id: String },

    #[error("Guild not found for interaction")]
    GuildNotFound,

    // Discord errors
    #[error("Discord API error: {message}")]
    Discord { message: String },

    // Generic errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<serenity::Error> for BotError {
    fn from(err: serenity::Error) -> Self {
        BotError::Discord {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        BotError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::Internal {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

use poise::serenity_prelude as serenity;
