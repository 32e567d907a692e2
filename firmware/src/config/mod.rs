mod settings;
mod store;

pub use settings::{netmask_prefix, Credentials};
pub use store::ConfigStore;
