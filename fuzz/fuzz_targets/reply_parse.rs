#![no_main]

use forage_reply::{has_balance_markers, parse_coins, parse_loot, parse_reply};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    let coins = parse_coins(&text);
    if !has_balance_markers(&text) && !text.contains("<:Coin:") && !text.contains("<:Bank:") {
        assert_eq!(coins.wallet, 0);
        assert_eq!(coins.bank, 0);
    }
    assert!(coins.total() >= coins.wallet.max(coins.bank));

    let loot = parse_loot(&text);
    if text.contains("caught a") {
        assert!(!loot.animals.is_empty());
    }
    if text.contains("found a") {
        assert!(!loot.items.is_empty());
    }

    let parsed = parse_reply(&text);
    assert_eq!(parsed.coins, coins);
    assert_eq!(parsed.loot, loot);
});
