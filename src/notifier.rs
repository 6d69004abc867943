pub mod terminal;

use crate::fluctuation::FluctuationReport;

/// Sink for fluctuation alerts.
pub trait Notifier: Send + Sync {
    fn notify(&self, symbol: &str, report: &FluctuationReport);
}
