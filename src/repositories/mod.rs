//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Questo modulo organizza i repository in sotto-moduli separati per una migliore manutenibilità.
//! Ogni repository gestisce le operazioni di database per una specifica entità.

// ************************* NOTA SU SQLX ************************* //

/*
   Qui usiamo le query "runtime" di sqlx (`sqlx::query`, `sqlx::query_as::<_, T>`) e non le
   macro `query!`/`query_as!`: le macro vogliono un database raggiungibile già in compilazione,
   mentre così il crate compila ovunque e lo schema viene verificato dai test `#[sqlx::test]`
   che applicano `migrations/` e i `fixtures/`.

   Le entity derivano `sqlx::FromRow`, quindi i nomi delle colonne nella SELECT devono
   coincidere con i campi (attenzione a `order` e `type` in images, parole riservate).

   Per SQL dinamico (filtri della paginazione, IN (...), insert multipli) si usa `QueryBuilder`:
   i valori passano SEMPRE con `push_bind`, solo i nomi di colonna (da whitelist) vanno nel testo.

   Numero di righe -> metodo:
   nessuna (INSERT/UPDATE/DELETE)  .execute(...)         -> last_insert_id() / rows_affected()
   zero o una                      .fetch_optional(...)
   esattamente una                 .fetch_one(...)        (COUNT(*), errore se vuoto)
   molte                           .fetch_all(...)

   Le scritture su più tabelle passano da `pool.begin()` e `.execute(&mut *tx)`;
   se la funzione esce con `?` prima di `tx.commit()` la transazione viene annullata al drop.
*/

// ************************* MODULI REPOSITORY ************************* //

pub mod chat;
pub mod comment;
pub mod image;
pub mod message;
pub mod pagination;
pub mod post;
pub mod traits;
pub mod user;
pub mod user_follower;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{Create, Delete, Paginate, Read, ReadMany, Update};

pub use chat::{CHAT_FIELDS, ChatMember, ChatRepository};
pub use comment::{COMMENT_FIELDS, CommentRepository};
pub use image::ImageRepository;
pub use message::{MESSAGE_FIELDS, MessageRepository};
pub use pagination::PageResult;
pub use post::{POST_FIELDS, PostRepository};
pub use user::UserRepository;
pub use user_follower::{FollowPair, UserFollowerRepository};
