use super::archive::{ArchiveOutcome, set_archived};
use super::kanban::{LEAD_BOARD, Lane};
use super::view::{ListParams, load};
use super::{EmailRequest, Pages, new_id, require, require_some};
use crate::db::{Row, Select, Write, from_row, to_row};
use crate::error::OpsError;
use crate::functions::{GENERATE_OFFER_CODE, SEND_CUSTOMER_EMAIL, SYNC_LEAD_CONFIGURATOR};
use chrono::Utc;
use opsdesk_schema::{Customer, Lead, LeadPatch, NewCustomer, NewLead, NewOffer, Offer, Record};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

/// Lead form: either an existing `customer_id` or new customer details.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLeadWithCustomer {
    #[serde(default)]
    pub customer: Option<NewCustomer>,
    pub lead: NewLead,
}

#[derive(Debug, Serialize)]
pub struct LeadCreated {
    pub customer: Customer,
    pub lead: Lead,
    pub configurator_synced: bool,
    /// Set when the configurator sync failed; the records are kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeadDetail {
    pub lead: Lead,
    pub offers: Vec<Offer>,
}

#[derive(Debug, Deserialize)]
struct OfferCode {
    code: String,
}

impl Pages {
    pub async fn list_leads(&self, params: &ListParams) -> Result<Vec<Lead>, OpsError> {
        load(&self.store, params, "created_at").await
    }

    pub async fn lead_board(&self, params: &ListParams) -> Result<Vec<Lane<Lead>>, OpsError> {
        let leads = self.list_leads(params).await?;
        Ok(LEAD_BOARD.group(leads, |lead| lead.status.as_str()))
    }

    pub async fn lead_detail(&self, id: &str) -> Result<LeadDetail, OpsError> {
        let lead = self
            .store
            .find::<Lead>(id, &["customer"])
            .await?
            .ok_or_else(|| OpsError::not_found(Lead::TABLE, id))?;
        let offers = self.offers_for_lead(id).await?;
        Ok(LeadDetail { lead, offers })
    }

    /// Create (or reuse, by email) the customer, then the lead linked to it.
    /// A new customer and its lead are written in one batch. Leads in a
    /// configurator pipeline are synced once afterwards.
    pub async fn create_lead(&self, form: NewLeadWithCustomer) -> Result<LeadCreated, OpsError> {
        let NewLeadWithCustomer { customer, lead } = form;
        require("title", &lead.title)?;

        let mut writes = Vec::with_capacity(2);
        let (customer_id, existing) = match customer {
            Some(mut details) => {
                require("customer.company_name", &details.company_name)?;
                details.email = details
                    .email
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty());
                match self.customer_by_email(details.email.as_deref()).await? {
                    Some(found) => (found.id.clone(), Some(found)),
                    None => {
                        let id = new_id();
                        let mut row = to_row(&details)?;
                        row.insert("id".to_string(), Value::String(id.clone()));
                        writes.push(Write::insert(Customer::TABLE, row));
                        (id, None)
                    }
                }
            }
            None => {
                let id = require_some("customer_id", lead.customer_id.as_deref())?;
                let found = self.store.get::<Customer>(id).await?;
                (found.id.clone(), Some(found))
            }
        };

        let mut lead_row = to_row(&lead)?;
        lead_row.insert("customer_id".to_string(), Value::String(customer_id));
        writes.push(Write::insert(Lead::TABLE, lead_row));

        let mut results = self.store.batch(writes).await?.into_iter();
        let customer = match existing {
            Some(customer) => customer,
            None => first_row(results.next(), Customer::TABLE)?,
        };
        let mut created: Lead = first_row(results.next(), Lead::TABLE)?;
        info!(lead_id = %created.id, customer_id = %customer.id, "lead created");

        let mut configurator_synced = false;
        let mut sync_error = None;
        if let Some(pipeline) = created.pipeline.as_deref()
            && self.functions_cfg.syncs_pipeline(pipeline)
        {
            match self.sync_configurator(&created.id).await {
                Ok(lead) => {
                    created = lead;
                    configurator_synced = true;
                }
                Err(e) => {
                    warn!(lead_id = %created.id, error = %e, "configurator sync failed");
                    sync_error = Some(e.to_string());
                }
            }
        }

        created.customer = Some(Box::new(customer.clone()));
        Ok(LeadCreated {
            customer,
            lead: created,
            configurator_synced,
            sync_error,
        })
    }

    async fn customer_by_email(&self, email: Option<&str>) -> Result<Option<Customer>, OpsError> {
        let Some(email) = email else {
            return Ok(None);
        };
        let select = Select::from(Customer::TABLE).eq("email", email).limit(1);
        Ok(self.store.list::<Customer>(select).await?.into_iter().next())
    }

    /// Push the lead to the external configurator and stamp the sync time.
    pub async fn sync_configurator(&self, lead_id: &str) -> Result<Lead, OpsError> {
        self.invoke(SYNC_LEAD_CONFIGURATOR, json!({ "lead_id": lead_id }))
            .await?;
        let mut patch = Row::new();
        patch.insert(
            "configurator_synced_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        self.store.update_fields::<Lead>(lead_id, patch).await
    }

    pub async fn update_lead(&self, id: &str, patch: &LeadPatch) -> Result<Lead, OpsError> {
        if let Some(title) = patch.title.as_deref() {
            require("title", title)?;
        }
        self.store.update::<Lead>(id, patch).await
    }

    /// Drag a lead card to another board column.
    pub async fn move_lead(&self, id: &str, dest: &str) -> Result<Lead, OpsError> {
        let lead = self.store.get::<Lead>(id).await?;
        match LEAD_BOARD
            .move_card(&self.store, id, &lead.status, dest)
            .await?
        {
            Some(row) => from_row(row),
            None => Ok(lead),
        }
    }

    /// Archiving a lead also archives its offers.
    pub async fn archive_lead(
        &self,
        id: &str,
        archived: bool,
    ) -> Result<ArchiveOutcome, OpsError> {
        set_archived(&self.store, Lead::TABLE, id, archived).await
    }

    pub async fn offers_for_lead(&self, lead_id: &str) -> Result<Vec<Offer>, OpsError> {
        self.store
            .list::<Offer>(
                Select::from(Offer::TABLE)
                    .eq("lead_id", lead_id)
                    .order_by("created_at", true),
            )
            .await
    }

    /// Create an offer whose code comes from `generate-offer-code`.
    pub async fn create_offer(&self, lead_id: &str, new: &NewOffer) -> Result<Offer, OpsError> {
        let lead = self.store.get::<Lead>(lead_id).await?;
        if lead.archived {
            return Err(OpsError::validation("cannot add an offer to an archived lead"));
        }

        let result = self
            .invoke(GENERATE_OFFER_CODE, json!({ "lead_id": lead_id }))
            .await?;
        let OfferCode { code } =
            serde_json::from_value(result).map_err(|e| OpsError::Function {
                name: GENERATE_OFFER_CODE.to_string(),
                status: None,
                message: format!("unexpected response: {e}"),
            })?;
        require("offer code", &code)?;

        let mut row = to_row(new)?;
        row.insert("lead_id".to_string(), Value::String(lead_id.to_string()));
        row.insert("offer_code".to_string(), Value::String(code));
        let offer = self.store.insert::<Offer>(&row).await?;
        info!(lead_id, offer_code = %offer.offer_code, "offer created");
        Ok(offer)
    }

    /// Email the lead's customer through `send-customer-email`.
    pub async fn email_lead_customer(
        &self,
        lead_id: &str,
        email: &EmailRequest,
    ) -> Result<Value, OpsError> {
        email.validate()?;
        let lead = self
            .store
            .find::<Lead>(lead_id, &["customer"])
            .await?
            .ok_or_else(|| OpsError::not_found(Lead::TABLE, lead_id))?;
        let to = lead
            .customer
            .as_deref()
            .and_then(|c| c.email.as_deref())
            .ok_or_else(|| OpsError::validation("lead customer has no email address"))?;

        self.invoke(
            SEND_CUSTOMER_EMAIL,
            json!({
                "to": to,
                "subject": email.subject,
                "message": email.message,
                "lead_id": lead_id,
            }),
        )
        .await
    }
}

fn first_row<R: Record>(rows: Option<Vec<Row>>, table: &str) -> Result<R, OpsError> {
    let row = rows
        .and_then(|rows| rows.into_iter().next())
        .ok_or_else(|| OpsError::validation(format!("insert into {table} returned no row")))?;
    from_row(row)
}
