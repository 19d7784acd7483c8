pub mod application_manager;
pub mod ban_manager;
pub mod form_manager;

pub use application_manager::{
    create_shared_application_manager, AnswerOutcome, BeginApplication, SharedApplicationManager,
};
pub use ban_manager::{create_shared_ban_manager, SharedBanManager};
pub use form_manager::{create_shared_form_manager, SharedFormManager, SharedFormStore};
