use serde::Serialize;

/// What one reconciliation pass wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub processed: usize,
    /// Results without a usable client name.
    pub skipped: usize,
    pub clients_created: usize,
    pub clients_reused: usize,
    pub sessions: usize,
    pub values: usize,
    pub notes: usize,
    pub orders: usize,
    pub order_items: usize,
    pub file_links: usize,
}
