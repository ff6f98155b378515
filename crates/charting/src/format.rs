//! Human-readable formatting for prices and market caps, used for trace
//! labels on the snapshot scatter.

/// Formats a USD price.
///
/// Prices at or above one cent get two decimals; smaller prices keep three
/// significant digits so sub-cent assets stay distinguishable.
pub fn format_price(price: f64) -> String {
    if price >= 0.01 {
        format!("${:.2}", price)
    } else if price > 0.0 {
        let exponent = price.log10().floor() as i32;
        let decimals = (2 - exponent) as usize;
        format!("${:.*}", decimals, price)
    } else {
        "$0.00".to_string()
    }
}

/// Formats a USD market cap with a T/B/M/K magnitude suffix.
pub fn format_market_cap(cap: f64) -> String {
    const TRILLION: f64 = 1e12;
    const BILLION: f64 = 1e9;
    const MILLION: f64 = 1e6;
    const THOUSAND: f64 = 1e3;

    if cap >= TRILLION {
        format!("${:.2}T", cap / TRILLION)
    } else if cap >= BILLION {
        format!("${:.2}B", cap / BILLION)
    } else if cap >= MILLION {
        format!("${:.2}M", cap / MILLION)
    } else if cap >= THOUSAND {
        format!("${:.2}K", cap / THOUSAND)
    } else {
        format!("${:.2}", cap)
    }
}
