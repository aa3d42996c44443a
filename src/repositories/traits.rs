//! Common repository traits
//!
//! Interfacce generiche per le operazioni sul database. Ogni repository implementa
//! solo quelle che hanno senso per la sua entità.

use crate::core::PaginationQuery;
use crate::repositories::pagination::PageResult;

/// Creazione di una nuova entità, l'id è assegnato dal database
pub trait Create<Entity, CreateDTO> {
    async fn create(&self, data: &CreateDTO) -> Result<Entity, sqlx::Error>;
}

/// Lettura per chiave primaria
///
/// # Returns
/// * `Ok(Some(Entity))` - Entity found
/// * `Ok(None)` - No entity with that ID
pub trait Read<Entity, Id> {
    async fn read(&self, id: &Id) -> Result<Option<Entity>, sqlx::Error>;
}

/// Lettura di più entità per lista di chiavi primarie
///
/// L'ordine del risultato è quello del database, non quello degli id passati.
pub trait ReadMany<Entity, Id> {
    async fn read_many(&self, ids: &[Id]) -> Result<Vec<Entity>, sqlx::Error>;
}

/// Aggiornamento parziale: solo i campi `Some(_)` del DTO vengono modificati.
/// Un id inesistente produce `sqlx::Error::RowNotFound`.
pub trait Update<Entity, UpdateDTO, Id> {
    async fn update(&self, id: &Id, data: &UpdateDTO) -> Result<Entity, sqlx::Error>;
}

/// Cancellazione per chiave primaria, `RowNotFound` se non esiste
pub trait Delete<Id> {
    async fn delete(&self, id: &Id) -> Result<(), sqlx::Error>;
}

/// Paginazione generica (cursore o pagina) su una risorsa.
/// `Scope` è il vincolo fisso della risorsa, es. il post per i commenti.
pub trait Paginate<Entity> {
    type Scope;

    async fn paginate(
        &self,
        scope: Self::Scope,
        query: &PaginationQuery,
    ) -> Result<PageResult<Entity>, sqlx::Error>;
}
