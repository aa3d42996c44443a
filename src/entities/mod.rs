//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità (models) che rappresentano i dati persistiti nel database.
//! Ogni entity corrisponde a una tabella nel database.

pub mod chat;
pub mod comment;
pub mod enums;
pub mod image;
pub mod message;
pub mod post;
pub mod user;
pub mod user_follower;

// Re-exports per facilitare l'import
pub use chat::Chat;
pub use comment::Comment;
pub use enums::{ImageType, UserRole};
pub use image::Image;
pub use message::Message;
pub use post::Post;
pub use user::User;
pub use user_follower::UserFollower;
