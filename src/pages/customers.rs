use super::archive::{ArchiveOutcome, set_archived};
use super::view::{ListParams, load};
use super::{Pages, require};
use crate::db::Select;
use crate::error::OpsError;
use opsdesk_schema::{Customer, CustomerPatch, Lead, NewCustomer, Order, Record};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CustomerDetail {
    pub customer: Customer,
    pub leads: Vec<Lead>,
    pub orders: Vec<Order>,
}

impl Pages {
    pub async fn list_customers(&self, params: &ListParams) -> Result<Vec<Customer>, OpsError> {
        load(&self.store, params, "company_name").await
    }

    pub async fn customer_detail(&self, id: &str) -> Result<CustomerDetail, OpsError> {
        let customer = self.store.get::<Customer>(id).await?;
        let leads = self
            .store
            .list::<Lead>(
                Select::from(Lead::TABLE)
                    .eq("customer_id", id)
                    .order_by("created_at", true),
            )
            .await?;
        let orders = self
            .store
            .list::<Order>(
                Select::from(Order::TABLE)
                    .eq("customer_id", id)
                    .order_by("created_at", true),
            )
            .await?;
        Ok(CustomerDetail {
            customer,
            leads,
            orders,
        })
    }

    pub async fn create_customer(&self, new: &NewCustomer) -> Result<Customer, OpsError> {
        require("company_name", &new.company_name)?;
        self.store.insert::<Customer>(new).await
    }

    pub async fn update_customer(
        &self,
        id: &str,
        patch: &CustomerPatch,
    ) -> Result<Customer, OpsError> {
        if let Some(name) = patch.company_name.as_deref() {
            require("company_name", name)?;
        }
        self.store.update::<Customer>(id, patch).await
    }

    /// Archiving a customer also archives its leads.
    pub async fn archive_customer(
        &self,
        id: &str,
        archived: bool,
    ) -> Result<ArchiveOutcome, OpsError> {
        set_archived(&self.store, Customer::TABLE, id, archived).await
    }
}
