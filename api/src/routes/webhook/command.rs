use ticket_reports::{RegionGroup, ReportConfig};

const REPORT_PREFIX: &str = "/sqm";
const GLOBAL_COMMAND: &str = "/sqmccan";

/// A recognised `/sqm…` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand<'a> {
    GlobalCcan,
    Regional(&'a RegionGroup),
    /// Starts with `/sqm` but names no known report.
    Unrecognized,
}

/// Lowercases, drops any `@botname` suffix, trims and removes spaces.
pub fn clean_command(text: &str) -> String {
    let lowered = text.to_lowercase();
    let head = lowered.split('@').next().unwrap_or_default();
    head.trim().replace(' ', "")
}

/// `None` when the text is not a report command at all.
pub fn parse_command<'a>(text: &str, config: &'a ReportConfig) -> Option<BotCommand<'a>> {
    let cleaned = clean_command(text);
    if !cleaned.starts_with(REPORT_PREFIX) {
        return None;
    }
    if cleaned == GLOBAL_COMMAND {
        return Some(BotCommand::GlobalCcan);
    }

    let command = config
        .region_groups()
        .iter()
        .find(|g| cleaned == format!("{REPORT_PREFIX}{}", g.name.to_lowercase()))
        .map(BotCommand::Regional)
        .unwrap_or(BotCommand::Unrecognized);
    Some(command)
}
