//! Order status normalization onto the canonical board columns.

pub const PENDING: &str = "pending";
pub const IN_PROGRESS: &str = "in_progress";
pub const COMPLETED: &str = "completed";

pub const CANONICAL: [&str; 3] = [PENDING, IN_PROGRESS, COMPLETED];

/// Map a stored order status to `pending | in_progress | completed`.
///
/// Total: unknown values come back unchanged.
pub fn normalize_order_status(status: &str) -> &str {
    match status {
        "draft" | "new" | "open" | "received" => PENDING,
        "confirmed" | "processing" | "in_production" | "production" | "ready" => IN_PROGRESS,
        "shipped" | "delivered" | "closed" | "done" | "invoiced" => COMPLETED,
        other => other,
    }
}

pub fn is_canonical(status: &str) -> bool {
    CANONICAL.contains(&status)
}
