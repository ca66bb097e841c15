pub mod permission;

pub use permission::CurrentUser;
