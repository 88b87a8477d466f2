pub mod db;
pub mod google;

pub use db::DbAdapter;
pub use google::GoogleIdentityAdapter;
