use super::scoring::CoinScore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

pub const WATCHLIST_TOP_N: usize = 21;
pub const WATCHLIST_MAX_LEN: usize = 25;

/// Scanner output written to `watchlist.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistSnapshot {
    pub timestamp: DateTime<Utc>,
    pub scanned: usize,
    pub count: usize,
    pub watchlist: Vec<CoinScore>,
}

fn by_score_desc(a: &CoinScore, b: &CoinScore) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.volume_24h.partial_cmp(&a.volume_24h).unwrap_or(Ordering::Equal))
        .then_with(|| a.symbol.cmp(&b.symbol))
}

/// Orders scored pairs into the final watchlist.
///
/// Core symbols come first (by score), then the best `top_n` remaining pairs,
/// then the hedge symbol last. Symbols are unique and the total never exceeds
/// `max_len`; if there are many core symbols the middle section shrinks.
pub fn assemble_watchlist(scores: Vec<CoinScore>, top_n: usize, max_len: usize) -> Vec<CoinScore> {
    let mut seen = HashSet::new();
    let mut unique: Vec<CoinScore> = Vec::with_capacity(scores.len());
    let mut sorted = scores;
    sorted.sort_by(by_score_desc);
    for score in sorted {
        if seen.insert(score.symbol.clone()) {
            unique.push(score);
        }
    }

    let hedge = unique.iter().position(|s| s.is_hedge && !s.is_core).map(|i| unique.remove(i));
    let (mut core, rest): (Vec<CoinScore>, Vec<CoinScore>) =
        unique.into_iter().partition(|s| s.is_core);
    core.truncate(max_len.saturating_sub(usize::from(hedge.is_some())));

    let room = max_len
        .saturating_sub(core.len())
        .saturating_sub(usize::from(hedge.is_some()))
        .min(top_n);

    let mut watchlist = core;
    watchlist.extend(rest.into_iter().filter(|s| !s.is_hedge).take(room));
    watchlist.extend(hedge);
    watchlist
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(symbol: &str, score: u32, is_core: bool, is_hedge: bool) -> CoinScore {
        CoinScore {
            symbol: symbol.to_string(),
            score,
            volume_24h: 1.0,
            atr_pct: 1.0,
            rsi: 50.0,
            momentum_pct: 0.0,
            reason: String::new(),
            is_core,
            is_hedge,
        }
    }

    #[test]
    fn test_core_first_hedge_last() {
        let scores = vec![
            coin("AAAUSDT", 90, false, false),
            coin("BTCUSDT", 40, true, false),
            coin("PAXGUSDT", 10, false, true),
            coin("ETHUSDT", 60, true, false),
            coin("BBBUSDT", 70, false, false),
        ];
        let list = assemble_watchlist(scores, WATCHLIST_TOP_N, WATCHLIST_MAX_LEN);
        let symbols: Vec<&str> = list.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ETHUSDT", "BTCUSDT", "AAAUSDT", "BBBUSDT", "PAXGUSDT"]);
    }

    #[test]
    fn test_length_bounded_and_unique() {
        let mut scores: Vec<CoinScore> = (0..60)
            .map(|i| coin(&format!("C{}USDT", i), i, false, false))
            .collect();
        scores.push(coin("BTCUSDT", 1, true, false));
        scores.push(coin("ETHUSDT", 2, true, false));
        scores.push(coin("SOLUSDT", 3, true, false));
        scores.push(coin("PAXGUSDT", 0, false, true));
        scores.push(coin("C59USDT", 59, false, false));

        let list = assemble_watchlist(scores, WATCHLIST_TOP_N, WATCHLIST_MAX_LEN);
        assert_eq!(list.len(), 25);
        let unique: HashSet<&str> = list.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(unique.len(), list.len());
        assert_eq!(list.last().unwrap().symbol, "PAXGUSDT");
        assert_eq!(list[3].symbol, "C59USDT");
    }

    #[test]
    fn test_many_cores_shrink_middle() {
        let mut scores: Vec<CoinScore> = (0..30)
            .map(|i| coin(&format!("K{}USDT", i), i, true, false))
            .collect();
        scores.push(coin("XUSDT", 100, false, false));
        scores.push(coin("PAXGUSDT", 0, false, true));
        let list = assemble_watchlist(scores, WATCHLIST_TOP_N, WATCHLIST_MAX_LEN);
        assert_eq!(list.len(), 25);
        assert!(list.iter().all(|s| s.symbol != "XUSDT"));
        assert_eq!(list.last().unwrap().symbol, "PAXGUSDT");
    }

    #[test]
    fn test_missing_hedge_is_fine() {
        let list = assemble_watchlist(vec![coin("AUSDT", 1, false, false)], 21, 25);
        assert_eq!(list.len(), 1);
    }
}
