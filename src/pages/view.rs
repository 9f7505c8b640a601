//! Shared list-page behavior: query parameters, in-memory search and a
//! local view that merges change events.

use super::status::normalize_order_status;
use crate::db::{Row, Select, Store, from_row, schema};
use crate::error::OpsError;
use crate::realtime::{ChangeEvent, ChangeKind};
use opsdesk_schema::{
    ContentItem, Customer, Lead, Movement, Offer, Order, Partner, PurchaseOrder, Record, Rma,
    Serial, ServiceOrder, ShippingOrder, WorkOrder,
};
use serde::Deserialize;
use serde_json::Value;

/// Query parameters every list page accepts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// Case-insensitive substring over the entity's searchable fields.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Show archived rows instead of active ones. Default: active.
    #[serde(default)]
    pub archived: Option<bool>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub desc: Option<bool>,
    /// Restrict to one record (deep link).
    #[serde(default)]
    pub id: Option<String>,
}

impl ListParams {
    pub fn archived(&self) -> bool {
        self.archived.unwrap_or(false)
    }

    /// Store query for `table`: equality filters plus one ordering column.
    pub fn select(&self, table: &str, default_sort: &str) -> Select {
        let mut select = Select::from(table);
        if schema::table(table).is_some_and(|def| def.has_column("archived")) {
            select = select.eq("archived", self.archived());
        }
        if let Some(status) = self.status() {
            select = select.eq("status", status);
        }
        if let Some(id) = self.id.as_deref() {
            select = select.eq("id", id);
        }
        let sort = self
            .sort
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(default_sort);
        select.order_by(sort, self.desc.unwrap_or(sort == "created_at"))
    }

    fn status(&self) -> Option<&str> {
        self.status.as_deref().filter(|s| !s.is_empty())
    }

    fn term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }
}

/// Fields a list page searches over.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;

    fn matches(&self, term_lower: &str) -> bool {
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(term_lower))
    }
}

/// Keep rows matching the search term; a no-op without one.
pub fn apply_search<R: Searchable>(rows: Vec<R>, params: &ListParams) -> Vec<R> {
    match params.term() {
        Some(term) => rows.into_iter().filter(|r| r.matches(&term)).collect(),
        None => rows,
    }
}

/// How a record type is listed: which relations come along with each row
/// and how its `status` compares against a status filter.
pub trait Listed: Record + Searchable {
    const EMBEDS: &'static [&'static str] = &[];

    /// Maps a stored status onto the values a filter names. When set, the
    /// status filter runs in memory instead of in the store.
    const STATUS_KEY: Option<fn(&str) -> &str> = None;

    /// Carry embedded relations over from the previous copy of this row.
    /// Pushed rows arrive without embeds.
    fn keep_embeds(&mut self, _previous: &Self) {}
}

fn list_select<R: Listed>(params: &ListParams, default_sort: &str) -> Select {
    let mut select = if R::STATUS_KEY.is_some() {
        ListParams {
            status: None,
            ..params.clone()
        }
        .select(R::TABLE, default_sort)
    } else {
        params.select(R::TABLE, default_sort)
    };
    for alias in R::EMBEDS {
        select = select.embed(alias);
    }
    select
}

fn status_matches<R: Listed>(params: &ListParams, row: &Row) -> bool {
    let Some(wanted) = params.status() else {
        return true;
    };
    let stored = row.get("status").and_then(Value::as_str);
    match R::STATUS_KEY {
        Some(key) => stored.map(key) == Some(wanted),
        None => stored == Some(wanted),
    }
}

/// One page of rows before search.
async fn fetch<R: Listed>(
    store: &Store,
    params: &ListParams,
    default_sort: &str,
) -> Result<Vec<R>, OpsError> {
    store
        .select(list_select::<R>(params, default_sort))
        .await?
        .into_iter()
        .filter(|row| status_matches::<R>(params, row))
        .map(from_row)
        .collect()
}

/// Load, then search in memory.
pub async fn load<R: Listed>(
    store: &Store,
    params: &ListParams,
    default_sort: &str,
) -> Result<Vec<R>, OpsError> {
    let rows = fetch::<R>(store, params, default_sort).await?;
    Ok(apply_search(rows, params))
}

/// Local copy of one list page that stays consistent with pushed changes.
///
/// Rows are keyed by id: an optimistic local insert followed by the push
/// event for the same row yields one entry, and the most recently applied
/// version wins. Loading and filtering match [`load`], so `visible()` agrees
/// with the list page for the same parameters.
pub struct ListView<R> {
    params: ListParams,
    rows: Vec<R>,
}

impl<R: Listed + Clone> ListView<R> {
    pub fn new(params: ListParams) -> Self {
        Self {
            params,
            rows: Vec::new(),
        }
    }

    pub async fn reload(&mut self, store: &Store, default_sort: &str) -> Result<(), OpsError> {
        // Search stays client-side so the local copy holds the full page.
        self.rows = fetch::<R>(store, &self.params, default_sort).await?;
        Ok(())
    }

    pub fn params(&self) -> &ListParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows after the search term is applied.
    pub fn visible(&self) -> Vec<R> {
        apply_search(self.rows.clone(), &self.params)
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.rows.iter().find(|r| r.id() == id)
    }

    /// Insert or replace by id.
    pub fn upsert(&mut self, row: R) {
        match self.rows.iter_mut().find(|r| r.id() == row.id()) {
            Some(slot) => *slot = row,
            None => self.rows.push(row),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<R> {
        let idx = self.rows.iter().position(|r| r.id() == id)?;
        Some(self.rows.remove(idx))
    }

    /// Merge one change event. Returns whether the local rows changed.
    pub fn apply(&mut self, event: &ChangeEvent) -> Result<bool, OpsError> {
        if event.table != R::TABLE {
            return Ok(false);
        }
        let Some(id) = event.row_id() else {
            return Ok(false);
        };

        if event.kind == ChangeKind::Delete || !self.admits(&event.row) {
            return Ok(self.remove(id).is_some());
        }

        let mut row: R = from_row(event.row.clone())?;
        if let Some(previous) = self.get(id) {
            row.keep_embeds(previous);
        }
        self.upsert(row);
        Ok(true)
    }

    /// Whether a pushed row still belongs on this page's filters.
    fn admits(&self, row: &Row) -> bool {
        if let Some(archived) = row.get("archived").and_then(|v| v.as_bool())
            && archived != self.params.archived()
        {
            return false;
        }
        if !status_matches::<R>(&self.params, row) {
            return false;
        }
        if let Some(id) = self.params.id.as_deref()
            && row.get("id").and_then(|v| v.as_str()) != Some(id)
        {
            return false;
        }
        true
    }
}

fn opt(value: &Option<String>) -> Option<&str> {
    value.as_deref()
}

fn fields<'a>(required: &[&'a str], optional: &[Option<&'a str>]) -> Vec<&'a str> {
    required
        .iter()
        .copied()
        .chain(optional.iter().flatten().copied())
        .collect()
}

impl Listed for Customer {}
impl Listed for Offer {}
impl Listed for Partner {}
impl Listed for WorkOrder {}
impl Listed for ServiceOrder {}
impl Listed for ShippingOrder {}
impl Listed for PurchaseOrder {}
impl Listed for Serial {}
impl Listed for Movement {}
impl Listed for ContentItem {}

impl Listed for Lead {
    const EMBEDS: &'static [&'static str] = &["customer"];

    fn keep_embeds(&mut self, previous: &Self) {
        if self.customer.is_none() && self.customer_id == previous.customer_id {
            self.customer.clone_from(&previous.customer);
        }
    }
}

impl Listed for Order {
    const EMBEDS: &'static [&'static str] = &["customer"];
    const STATUS_KEY: Option<fn(&str) -> &str> = Some(normalize_order_status);

    fn keep_embeds(&mut self, previous: &Self) {
        if self.customer.is_none() && self.customer_id == previous.customer_id {
            self.customer.clone_from(&previous.customer);
        }
    }
}

impl Listed for Rma {
    const EMBEDS: &'static [&'static str] = &["serial"];

    fn keep_embeds(&mut self, previous: &Self) {
        if self.serial.is_none() && self.serial_id == previous.serial_id {
            self.serial.clone_from(&previous.serial);
        }
    }
}

impl Searchable for Customer {
    fn search_fields(&self) -> Vec<&str> {
        fields(
            &[&self.company_name],
            &[
                opt(&self.customer_code),
                opt(&self.contact_name),
                opt(&self.email),
                opt(&self.city),
                opt(&self.country),
            ],
        )
    }
}

impl Searchable for Lead {
    fn search_fields(&self) -> Vec<&str> {
        let customer = self.customer.as_deref();
        fields(
            &[&self.title],
            &[
                opt(&self.pipeline),
                opt(&self.source),
                customer.map(|c| c.company_name.as_str()),
                customer.and_then(|c| opt(&c.email)),
            ],
        )
    }
}

impl Searchable for Offer {
    fn search_fields(&self) -> Vec<&str> {
        fields(&[&self.offer_code], &[opt(&self.notes)])
    }
}

impl Searchable for Partner {
    fn search_fields(&self) -> Vec<&str> {
        fields(
            &[&self.company_name, self.kind.as_str()],
            &[opt(&self.contact_name), opt(&self.email), opt(&self.country)],
        )
    }
}

impl Searchable for Order {
    fn search_fields(&self) -> Vec<&str> {
        fields(
            &[self.order_type.as_str()],
            &[
                opt(&self.order_number),
                opt(&self.product),
                self.customer.as_deref().map(|c| c.company_name.as_str()),
            ],
        )
    }
}

impl Searchable for WorkOrder {
    fn search_fields(&self) -> Vec<&str> {
        fields(&[&self.status], &[opt(&self.product), opt(&self.notes)])
    }
}

impl Searchable for ServiceOrder {
    fn search_fields(&self) -> Vec<&str> {
        fields(&[&self.service_type], &[opt(&self.technician), opt(&self.notes)])
    }
}

impl Searchable for ShippingOrder {
    fn search_fields(&self) -> Vec<&str> {
        fields(
            &[],
            &[
                opt(&self.ship_to),
                opt(&self.article),
                opt(&self.carrier),
                opt(&self.tracking_number),
            ],
        )
    }
}

impl Searchable for PurchaseOrder {
    fn search_fields(&self) -> Vec<&str> {
        fields(
            &[&self.supplier_name],
            &[opt(&self.po_number), opt(&self.supplier_email)],
        )
    }
}

impl Searchable for Serial {
    fn search_fields(&self) -> Vec<&str> {
        fields(&[&self.serial_number], &[opt(&self.product)])
    }
}

impl Searchable for Rma {
    fn search_fields(&self) -> Vec<&str> {
        fields(
            &[&self.reason],
            &[
                opt(&self.rma_number),
                self.serial.as_deref().map(|s| s.serial_number.as_str()),
            ],
        )
    }
}

impl Searchable for Movement {
    fn search_fields(&self) -> Vec<&str> {
        fields(&[&self.article], &[opt(&self.note)])
    }
}

impl Searchable for ContentItem {
    fn search_fields(&self) -> Vec<&str> {
        fields(&[&self.title], &[opt(&self.channel), opt(&self.body)])
    }
}
