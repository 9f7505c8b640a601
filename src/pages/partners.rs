use super::archive::{ArchiveOutcome, set_archived};
use super::view::{ListParams, load};
use super::{EmailRequest, Pages, require};
use crate::error::OpsError;
use crate::functions::SEND_PARTNER_EMAIL;
use opsdesk_schema::{NewPartner, Partner, PartnerKind, PartnerPatch, Record};
use serde_json::{Value, json};

impl Pages {
    /// Importers and resellers share one table; `kind` narrows the list.
    pub async fn list_partners(
        &self,
        kind: Option<PartnerKind>,
        params: &ListParams,
    ) -> Result<Vec<Partner>, OpsError> {
        let partners: Vec<Partner> = load(&self.store, params, "company_name").await?;
        Ok(match kind {
            Some(kind) => partners.into_iter().filter(|p| p.kind == kind).collect(),
            None => partners,
        })
    }

    pub async fn create_partner(&self, new: &NewPartner) -> Result<Partner, OpsError> {
        require("company_name", &new.company_name)?;
        self.store.insert::<Partner>(new).await
    }

    pub async fn update_partner(
        &self,
        id: &str,
        patch: &PartnerPatch,
    ) -> Result<Partner, OpsError> {
        if let Some(name) = patch.company_name.as_deref() {
            require("company_name", name)?;
        }
        self.store.update::<Partner>(id, patch).await
    }

    pub async fn archive_partner(
        &self,
        id: &str,
        archived: bool,
    ) -> Result<ArchiveOutcome, OpsError> {
        set_archived(&self.store, Partner::TABLE, id, archived).await
    }

    pub async fn email_partner(&self, id: &str, email: &EmailRequest) -> Result<Value, OpsError> {
        email.validate()?;
        let partner = self.store.get::<Partner>(id).await?;
        let to = partner
            .email
            .as_deref()
            .ok_or_else(|| OpsError::validation("partner has no email address"))?;

        self.invoke(
            SEND_PARTNER_EMAIL,
            json!({
                "to": to,
                "subject": email.subject,
                "message": email.message,
                "partner_id": partner.id,
                "partner_kind": partner.kind.as_str(),
            }),
        )
        .await
    }
}
