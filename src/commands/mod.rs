pub mod bans;
pub mod forms;
pub mod general;

pub use bans::{banapply, unbanapply};
pub use forms::{
    addquestion, createform, createpanel, deleteform, recreateform, setcategory, setchannel,
    setcooldown, setrole,
};
pub use general::{help, ping};
