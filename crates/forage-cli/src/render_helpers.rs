//! Plain-text rendering for the operator surface.

use forage_store::{RosterDocument, StatsDocument};

const NAME_COLUMN_WIDTH: usize = 12;

/// Inserts thousands separators: `1234567` → `1,234,567`.
pub fn format_grouped(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (offset, ch) in digits.chars().enumerate() {
        if offset > 0 && (digits.len() - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn truncate_name(name: &str) -> String {
    name.chars().take(NAME_COLUMN_WIDTH).collect()
}

/// Fixed-width statistics table in roster order, with totals and fleet
/// status. Accounts without a statistics record are skipped.
pub fn render_stats_table(
    roster: &RosterDocument,
    stats: &StatsDocument,
    running: usize,
) -> String {
    if stats.stats.is_empty() {
        return "No statistics yet.".to_string();
    }

    let mut out = String::new();
    out.push_str("Idx Name          Coins     Cmds   Items  Animals  Fails\n");
    out.push_str("--- ------------- --------- ------ ------ -------- -----\n");

    let mut total_coins = 0u64;
    let mut total_commands = 0u64;
    let mut total_items = 0u64;
    let mut total_animals = 0u64;
    let mut total_failures = 0u64;

    for (index, account) in roster.accounts.iter().enumerate() {
        let Some(record) = stats.stats.get(&account.credential) else {
            continue;
        };
        out.push_str(&format!(
            "{index:<3} {name:<13} {coins:<9} {commands:<6} {items:<6} {animals:<8} {failures:<5}\n",
            name = truncate_name(&record.name),
            coins = format_grouped(record.coins),
            commands = record.commands,
            items = record.items,
            animals = record.animals,
            failures = record.failures,
        ));
        total_coins = total_coins.saturating_add(record.coins);
        total_commands = total_commands.saturating_add(record.commands);
        total_items = total_items.saturating_add(record.items);
        total_animals = total_animals.saturating_add(record.animals);
        total_failures = total_failures.saturating_add(record.failures);
    }

    let active = roster
        .accounts
        .iter()
        .filter(|account| account.active)
        .count();
    out.push_str(&format!(
        "\nTotals  Coins: {}  Cmds: {}  Items: {}  Animals: {}  Fails: {}\n",
        format_grouped(total_coins),
        total_commands,
        total_items,
        total_animals,
        total_failures,
    ));
    out.push_str(&format!(
        "Active: {active}/{}  Running: {running}",
        roster.accounts.len()
    ));
    out
}

/// Usage summary for the operator command surface.
pub fn render_help_text() -> String {
    [
        "Commands:",
        "  help                                 show this summary",
        "  stats                                print the statistics table",
        "  add-account <credential> <channel>   register an account and attempt login",
        "  remove-account <index>               stop and delete an account and its statistics",
        "  toggle <index>                       flip an account's active flag",
        "  start-all                            start every active account",
        "  stop-all                             stop every running session",
        "  grant <user>                         authorize an operator",
        "  revoke <user>                        withdraw an operator's access",
        "  reset-stats                          zero every account's counters",
        "  export-stats                         write a masked statistics snapshot",
    ]
    .join("\n")
}
