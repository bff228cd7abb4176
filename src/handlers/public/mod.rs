// handlers/public/mod.rs - endpoints reachable without a token

pub mod files;
pub mod health;
pub mod login;

pub use files::get_file;
pub use health::health;
pub use login::login;
