//! Output formatter trait

use council_application::CouncilTurn;
use council_domain::OutputFormat;

/// Trait for formatting council turns
pub trait OutputFormatter {
    /// Format every stage of the turn
    fn format(&self, turn: &CouncilTurn) -> String;

    /// Format as JSON
    fn format_json(&self, turn: &CouncilTurn) -> String;

    /// Format synthesis only (concise output)
    fn format_synthesis_only(&self, turn: &CouncilTurn) -> String;

    /// Dispatch on the requested format
    fn render(&self, turn: &CouncilTurn, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format(turn),
            OutputFormat::Synthesis => self.format_synthesis_only(turn),
            OutputFormat::Json => self.format_json(turn),
        }
    }
}
