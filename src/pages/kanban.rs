//! Kanban boards: column definitions, card grouping and drag completion.

use super::status;
use crate::db::{Row, Store, Write};
use crate::error::OpsError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BoardColumn {
    pub id: &'static str,
    pub title: &'static str,
}

const fn col(id: &'static str, title: &'static str) -> BoardColumn {
    BoardColumn { id, title }
}

/// Derives the update patch for a card dropped on `dest`.
type PatchRule = fn(dest: &str, now: DateTime<Utc>) -> Row;

pub struct Board {
    pub name: &'static str,
    pub table: &'static str,
    pub columns: &'static [BoardColumn],
    rule: PatchRule,
}

/// Outcome of planning a drop.
#[derive(Debug, Clone, PartialEq)]
pub enum MovePlan {
    /// Dropped on its current column; nothing to write.
    Noop,
    Update(Row),
}

#[derive(Debug, Serialize)]
pub struct Lane<R> {
    pub column: BoardColumn,
    pub cards: Vec<R>,
}

fn stamp(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339())
}

fn status_patch(dest: &str) -> Row {
    let mut patch = Row::new();
    patch.insert("status".to_string(), Value::String(dest.to_string()));
    patch
}

fn lead_rule(dest: &str, _now: DateTime<Utc>) -> Row {
    let mut patch = status_patch(dest);
    patch.insert("converted".to_string(), Value::Bool(dest == "won"));
    patch
}

fn order_rule(dest: &str, now: DateTime<Utc>) -> Row {
    let mut patch = status_patch(dest);
    let completed_at = if dest == status::COMPLETED {
        stamp(now)
    } else {
        Value::Null
    };
    patch.insert("completed_at".to_string(), completed_at);
    patch
}

fn work_order_rule(dest: &str, now: DateTime<Utc>) -> Row {
    let mut patch = status_patch(dest);
    if dest == "done" {
        patch.insert("completed_at".to_string(), stamp(now));
    }
    patch
}

fn content_rule(dest: &str, now: DateTime<Utc>) -> Row {
    let mut patch = status_patch(dest);
    let published = dest == "published";
    patch.insert("published".to_string(), Value::Bool(published));
    if published {
        patch.insert("published_at".to_string(), stamp(now));
    }
    patch
}

pub static LEAD_BOARD: Board = Board {
    name: "leads",
    table: "leads",
    columns: &[
        col("new", "New"),
        col("contacted", "Contacted"),
        col("qualified", "Qualified"),
        col("offer_sent", "Offer sent"),
        col("negotiation", "Negotiation"),
        col("won", "Won"),
        col("lost", "Lost"),
    ],
    rule: lead_rule,
};

pub static ORDER_BOARD: Board = Board {
    name: "orders",
    table: "orders",
    columns: &[
        col(status::PENDING, "Pending"),
        col(status::IN_PROGRESS, "In progress"),
        col(status::COMPLETED, "Completed"),
    ],
    rule: order_rule,
};

pub static WORK_ORDER_BOARD: Board = Board {
    name: "work_orders",
    table: "work_orders",
    columns: &[
        col("queued", "Queued"),
        col("in_progress", "In progress"),
        col("quality_check", "Quality check"),
        col("done", "Done"),
    ],
    rule: work_order_rule,
};

pub static CONTENT_BOARD: Board = Board {
    name: "content",
    table: "content_items",
    columns: &[
        col("idea", "Idea"),
        col("draft", "Draft"),
        col("review", "Review"),
        col("scheduled", "Scheduled"),
        col("published", "Published"),
    ],
    rule: content_rule,
};

pub static BOARDS: [&Board; 4] = [&LEAD_BOARD, &ORDER_BOARD, &WORK_ORDER_BOARD, &CONTENT_BOARD];

pub fn board(name: &str) -> Option<&'static Board> {
    BOARDS.iter().copied().find(|b| b.name == name)
}

impl Board {
    pub fn has_column(&self, id: &str) -> bool {
        self.columns.iter().any(|c| c.id == id)
    }

    pub fn plan_move(
        &self,
        current: &str,
        dest: &str,
        now: DateTime<Utc>,
    ) -> Result<MovePlan, OpsError> {
        if current == dest {
            return Ok(MovePlan::Noop);
        }
        if !self.has_column(dest) {
            return Err(OpsError::validation(format!(
                "unknown {} column: {dest}",
                self.name
            )));
        }
        Ok(MovePlan::Update((self.rule)(dest, now)))
    }

    /// Group cards into lanes. Cards whose column is unknown are left out.
    pub fn group<R>(&self, cards: Vec<R>, column_of: impl Fn(&R) -> &str) -> Vec<Lane<R>> {
        let mut lanes: Vec<Lane<R>> = self
            .columns
            .iter()
            .map(|column| Lane {
                column: *column,
                cards: Vec::new(),
            })
            .collect();
        for card in cards {
            let id = column_of(&card);
            if let Some(lane) = lanes.iter_mut().find(|l| l.column.id == id) {
                lane.cards.push(card);
            } else {
                debug!(board = self.name, column = id, "card outside board columns");
            }
        }
        lanes
    }

    /// Complete a drop: at most one update call, no compensation on failure.
    ///
    /// Returns the updated row, or `None` when the drop was a no-op.
    pub async fn move_card(
        &self,
        store: &Store,
        id: &str,
        current: &str,
        dest: &str,
    ) -> Result<Option<Row>, OpsError> {
        let patch = match self.plan_move(current, dest, Utc::now())? {
            MovePlan::Noop => return Ok(None),
            MovePlan::Update(patch) => patch,
        };

        let rows = store
            .write(Write::update_by_id(self.table, id, patch))
            .await
            .inspect_err(|e| {
                warn!(board = self.name, id, dest, error = %e, "card move failed");
            })?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| OpsError::not_found(self.table, id))?;
        debug!(board = self.name, id, from = current, to = dest, "card moved");
        Ok(Some(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(plan: MovePlan) -> Row {
        match plan {
            MovePlan::Update(patch) => patch,
            MovePlan::Noop => panic!("expected an update"),
        }
    }

    #[test]
    fn dropping_on_current_column_is_noop() {
        for board in BOARDS {
            let first = board.columns[0].id;
            assert_eq!(
                board.plan_move(first, first, Utc::now()).unwrap(),
                MovePlan::Noop
            );
        }
    }

    #[test]
    fn unknown_destination_is_rejected() {
        assert!(matches!(
            LEAD_BOARD.plan_move("new", "archived", Utc::now()),
            Err(OpsError::Validation(_))
        ));
    }

    #[test]
    fn lead_won_sets_converted() {
        let patch = update(LEAD_BOARD.plan_move("negotiation", "won", Utc::now()).unwrap());
        assert_eq!(patch["status"], json!("won"));
        assert_eq!(patch["converted"], json!(true));

        let patch = update(LEAD_BOARD.plan_move("won", "lost", Utc::now()).unwrap());
        assert_eq!(patch["converted"], json!(false));
    }

    #[test]
    fn order_completion_stamps_and_clears_completed_at() {
        let patch = update(ORDER_BOARD.plan_move("pending", "completed", Utc::now()).unwrap());
        assert!(patch["completed_at"].is_string());

        let patch = update(ORDER_BOARD.plan_move("completed", "in_progress", Utc::now()).unwrap());
        assert_eq!(patch["completed_at"], Value::Null);
    }

    #[test]
    fn content_publish_flags() {
        let patch = update(CONTENT_BOARD.plan_move("review", "published", Utc::now()).unwrap());
        assert_eq!(patch["published"], json!(true));
        assert!(patch["published_at"].is_string());

        let patch = update(CONTENT_BOARD.plan_move("published", "draft", Utc::now()).unwrap());
        assert_eq!(patch["published"], json!(false));
        assert!(!patch.contains_key("published_at"));
    }

    #[test]
    fn work_order_done_stamps_completion() {
        let now = Utc::now();
        let patch = update(WORK_ORDER_BOARD.plan_move("quality_check", "done", now).unwrap());
        assert!(patch["completed_at"].is_string());
        let patch = update(WORK_ORDER_BOARD.plan_move("queued", "in_progress", now).unwrap());
        assert!(!patch.contains_key("completed_at"));
    }

    #[test]
    fn group_places_cards_in_declared_order() {
        let cards = vec![("a", "won"), ("b", "new"), ("c", "mystery"), ("d", "won")];
        let lanes = LEAD_BOARD.group(cards, |c| c.1);
        assert_eq!(lanes.len(), LEAD_BOARD.columns.len());
        assert_eq!(lanes[0].cards, vec![("b", "new")]);
        let won = lanes.iter().find(|l| l.column.id == "won").unwrap();
        assert_eq!(won.cards.len(), 2);
    }
}
