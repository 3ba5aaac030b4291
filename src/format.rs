//! Presentation helpers kept outside the calculation core.
//!
//! Months are 1-based everywhere in the crate; [`zero_based_month`] is the only
//! conversion for front ends that index months from zero.

use chrono::{Datelike, NaiveDate};

const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Spanish name of a 1-based month, or `None` outside 1..=12.
#[must_use]
pub fn month_label(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month.checked_sub(1)?).ok()?;
    MONTH_NAMES.get(index).copied()
}

/// Long month label in the `es-ES` style, e.g. `"marzo de 2023"`.
#[must_use]
pub fn month_name(year: i32, month: u32) -> String {
    month_label(month).map_or_else(
        || format!("{month}/{year}"),
        |label| format!("{label} de {year}"),
    )
}

/// Converts a 1-based month to the 0-based index some UIs expect.
#[must_use]
pub const fn zero_based_month(month: u32) -> Option<u32> {
    match month {
        1..=12 => Some(month - 1),
        _ => None,
    }
}

/// Formats a period as `"marzo de 2023 a junio de 2023"`.
#[must_use]
pub fn format_period(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{} a {}",
        month_name(start.year(), start.month()),
        month_name(end.year(), end.month())
    )
}

/// Formats an amount as Argentine pesos: `$ 1.234,56`, `-$ 10,00`.
///
/// Rounds to cents for display only; stored values are never rounded.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "$ -".to_string();
    }

    let cents = (amount.abs() * 100.0).round() as u64;
    let units = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}$ {grouped},{fraction:02}")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(2023, 3), "marzo de 2023");
        assert_eq!(month_name(2024, 12), "diciembre de 2024");
        assert_eq!(month_name(2024, 13), "13/2024");
        assert_eq!(month_name(2024, 0), "0/2024");
    }

    #[test]
    fn test_zero_based_month() {
        assert_eq!(zero_based_month(1), Some(0));
        assert_eq!(zero_based_month(12), Some(11));
        assert_eq!(zero_based_month(0), None);
        assert_eq!(zero_based_month(13), None);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$ 0,00");
        assert_eq!(format_currency(999.5), "$ 999,50");
        assert_eq!(format_currency(1234.567), "$ 1.234,57");
        assert_eq!(format_currency(1_000_000.0), "$ 1.000.000,00");
        assert_eq!(format_currency(-10.0), "-$ 10,00");
        assert_eq!(format_currency(-0.001), "$ 0,00");
    }

    #[test]
    fn test_format_period() {
        let start = NaiveDate::from_ymd_opt(2023, 3, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 6, 2).unwrap();
        assert_eq!(format_period(start, end), "marzo de 2023 a junio de 2023");
    }
}
