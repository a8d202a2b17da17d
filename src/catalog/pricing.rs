use serde::Serialize;

/// A billing period offered at checkout and its discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationOption {
    pub months: u32,
    pub discount_percent: u32,
}

pub const DURATION_OPTIONS: [DurationOption; 4] = [
    DurationOption { months: 1, discount_percent: 0 },
    DurationOption { months: 3, discount_percent: 5 },
    DurationOption { months: 6, discount_percent: 10 },
    DurationOption { months: 12, discount_percent: 15 },
];

pub fn duration_option(months: u32) -> Option<DurationOption> {
    DURATION_OPTIONS.iter().copied().find(|o| o.months == months)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quote {
    pub months: u32,
    pub discount_percent: u32,
    /// Undiscounted price for the whole period.
    pub list_total: f64,
    pub total: f64,
    pub monthly: f64,
    pub savings: f64,
}

/// total = price × months × (1 − discount / 100), monthly = total / months.
pub fn quote(price_monthly: f64, option: DurationOption) -> Quote {
    let months = option.months.max(1);
    let list_total = price_monthly * f64::from(months);
    // Multiply before dividing so whole-percent discounts stay exact.
    let total = list_total * f64::from(100 - option.discount_percent.min(100)) / 100.0;
    Quote {
        months,
        discount_percent: option.discount_percent,
        list_total,
        total,
        monthly: total / f64::from(months),
        savings: list_total - total,
    }
}

/// Quotes for every checkout duration.
pub fn quotes(price_monthly: f64) -> Vec<Quote> {
    DURATION_OPTIONS
        .iter()
        .map(|option| quote(price_monthly, *option))
        .collect()
}

/// Formats an amount with thousands separators. Rupiah is shown without
/// decimals, every other currency with two.
pub fn format_price(amount: f64, currency: &str) -> String {
    let decimals = if currency.eq_ignore_ascii_case("IDR") { 0 } else { 2 };
    let rendered = format!("{:.*}", decimals, amount.abs());
    let (whole, fraction) = match rendered.split_once('.') {
        Some((whole, fraction)) => (whole.to_string(), Some(fraction.to_string())),
        None => (rendered, None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    match fraction {
        Some(fraction) => format!("{currency} {sign}{grouped}.{fraction}"),
        None => format!("{currency} {sign}{grouped}"),
    }
}
