pub mod applications;
pub mod bans;
pub mod forms;
pub mod store;

pub use applications::{ApplicationRecord, ApplicationStore};
pub use bans::{BanLedger, BanStatus};
pub use forms::{FormDefinition, FormRegistry};
pub use store::JsonStore;
