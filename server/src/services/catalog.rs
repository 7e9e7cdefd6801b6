use std::sync::Arc;

use tracing::info;

use crate::models::ticket::TicketType;
use crate::store::CatalogStore;
use crate::utils::error::AppError;

pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<TicketType>, AppError> {
        self.store.list_ticket_types().await
    }

    pub async fn get(&self, id: i64) -> Result<Option<TicketType>, AppError> {
        self.store.find_ticket_type(id).await
    }

    pub async fn create(&self, name: &str, price: i64) -> Result<TicketType, AppError> {
        let name = validate(name, price)?;
        let ticket_type = self.store.insert_ticket_type(name, price).await?;
        info!(ticket_type_id = ticket_type.id, name = %ticket_type.name, price, "Ticket type created");
        Ok(ticket_type)
    }

    /// Overwrites name and price. Existing bookings keep their snapshot total.
    pub async fn update(&self, id: i64, name: &str, price: i64) -> Result<(), AppError> {
        let name = validate(name, price)?;
        if !self.store.update_ticket_type(id, name, price).await? {
            return Err(AppError::NotFound(format!("Ticket type {id} not found")));
        }
        info!(ticket_type_id = id, price, "Ticket type updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.store.delete_ticket_type(id).await?;
        info!(ticket_type_id = id, "Ticket type deleted");
        Ok(())
    }
}

fn validate(name: &str, price: i64) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() || price <= 0 {
        return Err(AppError::ValidationError(
            "Ticket name and a positive price are required".to_string(),
        ));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_created_ticket_type_is_listed_once() {
        let catalog = service();
        let existing = catalog.create("Morning", 80_000).await.unwrap();

        let created = catalog.create("Standard", 100_000).await.unwrap();
        assert_ne!(created.id, existing.id);

        let listed = catalog.list().await.unwrap();
        let matches: Vec<_> = listed.iter().filter(|t| t.id == created.id).collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "Standard");
        assert_eq!(matches[0].price, 100_000);
        assert_eq!(listed[0].id, created.id);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name_and_non_positive_price() {
        let catalog = service();

        for (name, price) in [("", 100), ("   ", 100), ("Standard", 0), ("Standard", -5)] {
            assert!(matches!(
                catalog.create(name, price).await,
                Err(AppError::ValidationError(_))
            ));
        }
        assert!(catalog.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_overwrites_fields() {
        let catalog = service();
        let ticket = catalog.create("Standard", 100_000).await.unwrap();

        catalog.update(ticket.id, "Standard+", 120_000).await.unwrap();
        let updated = catalog.get(ticket.id).await.unwrap().unwrap();
        assert_eq!(updated.name, "Standard+");
        assert_eq!(updated.price, 120_000);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let catalog = service();
        assert!(matches!(
            catalog.update(404, "Ghost", 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let catalog = service();
        let ticket = catalog.create("Standard", 100_000).await.unwrap();

        catalog.delete(ticket.id).await.unwrap();
        catalog.delete(ticket.id).await.unwrap();
        assert!(catalog.list().await.unwrap().is_empty());
    }
}
