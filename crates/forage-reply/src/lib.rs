//! Reply-text parsing for game-bot reward messages.
//!
//! The game bot answers commands with loosely structured text: currency
//! balances marked by emoji references and loot lines listing a quantity,
//! an emoji reference, and a name. Everything here is pure and tolerant —
//! absent or malformed markers yield zero/empty readings, never an error.

use std::sync::LazyLock;

use regex::Regex;

/// Marker preceding the wallet balance in a balance reply.
pub const WALLET_MARKER: &str = "<:Coin:";
/// Marker preceding the bank balance in a balance reply.
pub const BANK_MARKER: &str = "<:Bank:";

const UNKNOWN_ANIMAL: &str = "Unknown Animal";
const UNKNOWN_ITEM: &str = "Unknown Item";

static WALLET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<:Coin:.*?>\s*([\d,]+)").expect("wallet pattern is valid"));
static BANK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<:Bank:.*?>\s*([\d,]+)").expect("bank pattern is valid"));
static LOOT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*\d+ [<:a-zA-Z0-9]+:\d+> ([^*\n]+)").expect("loot pattern is valid")
});

/// Wallet and bank balances extracted from one reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoinReading {
    pub wallet: u64,
    pub bank: u64,
}

impl CoinReading {
    pub fn total(&self) -> u64 {
        self.wallet.saturating_add(self.bank)
    }
}

/// Loot names extracted from one reply, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LootReading {
    pub animals: Vec<String>,
    pub items: Vec<String>,
}

/// Everything one correlated reply contributes to the statistics record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReply {
    pub coins: CoinReading,
    pub loot: LootReading,
}

/// True when the text carries both balance markers; partial or unrelated
/// text should not be mistaken for a balance report.
pub fn has_balance_markers(text: &str) -> bool {
    text.contains(WALLET_MARKER) && text.contains(BANK_MARKER)
}

/// Extracts wallet and bank balances. A missing marker reads as zero;
/// thousands separators are stripped before parsing.
pub fn parse_coins(text: &str) -> CoinReading {
    CoinReading {
        wallet: grouped_amount(&WALLET_PATTERN, text),
        bank: grouped_amount(&BANK_PATTERN, text),
    }
}

fn grouped_amount(pattern: &Regex, text: &str) -> u64 {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|digits| digits.as_str().replace(',', ""))
        .and_then(|digits| digits.parse::<u64>().ok())
        .unwrap_or(0)
}

/// Extracts loot names from repeated `**<qty> <emoji> <name>` lines.
///
/// Classification is per message, not per line: a hunting/catch phrase
/// anywhere in the text marks every match as an animal, otherwise every
/// match is an item. When the structured pattern finds nothing but the text
/// still announces a catch ("caught a") or a find ("found a"), a single
/// placeholder entry is synthesized so the event is not lost entirely.
/// That fallback is a heuristic for reply formats the pattern misses, not
/// a structural guarantee.
pub fn parse_loot(text: &str) -> LootReading {
    let mut reading = LootReading::default();
    let catch_context = text.contains("caught") || text.contains("hunting");
    for captures in LOOT_PATTERN.captures_iter(text) {
        let name = captures[1].trim().to_string();
        if catch_context {
            reading.animals.push(name);
        } else {
            reading.items.push(name);
        }
    }

    if reading.animals.is_empty() && text.contains("caught a") {
        reading.animals.push(UNKNOWN_ANIMAL.to_string());
    }
    if reading.items.is_empty() && text.contains("found a") {
        reading.items.push(UNKNOWN_ITEM.to_string());
    }
    reading
}

/// Full extraction over one assembled reply text.
pub fn parse_reply(text: &str) -> ParsedReply {
    ParsedReply {
        coins: parse_coins(text),
        loot: parse_loot(text),
    }
}
