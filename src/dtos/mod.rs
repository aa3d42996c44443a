//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione esterna (API, JSON camelCase) dalla rappresentazione interna (entities).

pub mod auth;
pub mod chat;
pub mod comment;
pub mod message;
pub mod pagination;
pub mod post;
pub mod user;
pub mod ws_event;

pub use auth::{AccessTokenDTO, RefreshTokenDTO, RegisterUserDTO, TokensDTO};
pub use chat::{ChatDTO, CreateChatDTO, EnterChatDTO};
pub use comment::{CommentDTO, CreateCommentDTO, UpdateCommentDTO};
pub use message::{CreateMessageDTO, MessageDTO, SendMessageDTO};
pub use pagination::{CursorDTO, Paginated};
pub use post::{CreatePostDTO, ImageDTO, ImageUploadDTO, PostDTO, UpdatePostDTO};
pub use user::{CreateUserDTO, FollowerDTO, FollowersQuery, UserDTO};
pub use ws_event::{ClientEvent, ServerEvent, WsExceptionDTO};
