use crate::fluctuation::FluctuationReport;
use crate::notifier::Notifier;

pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, symbol: &str, report: &FluctuationReport) {
        tracing::warn!(
            symbol = symbol,
            threshold_percent = report.threshold_percent,
            max_close = report.max_close,
            min_close = report.min_close,
            fluctuation_percent = report.fluctuation_percent,
            "ALERT: {} price moved more than {}% over the period",
            symbol,
            report.threshold_percent,
        );
    }
}
