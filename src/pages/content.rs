use super::archive::{ArchiveOutcome, set_archived};
use super::kanban::{CONTENT_BOARD, Lane};
use super::view::{ListParams, load};
use super::{Pages, require};
use crate::db::from_row;
use crate::error::OpsError;
use opsdesk_schema::{ContentItem, ContentItemPatch, NewContentItem, Record};

impl Pages {
    pub async fn list_content(&self, params: &ListParams) -> Result<Vec<ContentItem>, OpsError> {
        load(&self.store, params, "due_date").await
    }

    pub async fn content_board(
        &self,
        params: &ListParams,
    ) -> Result<Vec<Lane<ContentItem>>, OpsError> {
        let items = self.list_content(params).await?;
        Ok(CONTENT_BOARD.group(items, |item| item.status.as_str()))
    }

    pub async fn create_content(&self, new: &NewContentItem) -> Result<ContentItem, OpsError> {
        require("title", &new.title)?;
        self.store.insert::<ContentItem>(new).await
    }

    pub async fn update_content(
        &self,
        id: &str,
        patch: &ContentItemPatch,
    ) -> Result<ContentItem, OpsError> {
        if let Some(title) = patch.title.as_deref() {
            require("title", title)?;
        }
        self.store.update::<ContentItem>(id, patch).await
    }

    pub async fn move_content(&self, id: &str, dest: &str) -> Result<ContentItem, OpsError> {
        let item = self.store.get::<ContentItem>(id).await?;
        match CONTENT_BOARD
            .move_card(&self.store, id, &item.status, dest)
            .await?
        {
            Some(row) => from_row(row),
            None => Ok(item),
        }
    }

    pub async fn archive_content(
        &self,
        id: &str,
        archived: bool,
    ) -> Result<ArchiveOutcome, OpsError> {
        set_archived(&self.store, ContentItem::TABLE, id, archived).await
    }
}
