use crate::domain::wallet::{DateRange, Transaction};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Days, Utc};

pub const EXPORT_HEADER: [&str; 8] = [
    "Date",
    "Time",
    "Recharged By",
    "Amount",
    "Type",
    "Status",
    "Payment ID",
    "Description",
];

/// A rendered CSV download.
#[derive(Debug, Clone)]
pub struct RechargeExport {
    pub filename: String,
    pub content: Vec<u8>,
    pub rows: usize,
}

pub fn render_csv(transactions: &[Transaction]) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new().from_writer(Vec::new());
    wtr.write_record(EXPORT_HEADER)?;

    for t in transactions {
        wtr.write_record([
            t.created_at.format("%d/%m/%Y").to_string(),
            t.created_at.format("%H:%M").to_string(),
            t.user_id.clone(),
            format!("₹{}", t.amount),
            t.kind.as_str().to_string(),
            t.status.as_str().to_string(),
            t.razorpay_payment_id.clone().unwrap_or_default(),
            t.description.clone(),
        ])?;
    }

    wtr.into_inner().map_err(|e| anyhow!("csv flush failed: {}", e.error()))
}

fn filename_safe(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// `recharge-history_<unit>_<id>[_<start>_to_<end>]_<millis>.csv`, reduced to
/// ASCII alphanumerics and dashes so it fits a header value.
pub fn export_filename(unit_name: &str, business_unit_id: &str, range: &DateRange, now: DateTime<Utc>) -> String {
    let dates = match (range.from, range.until) {
        (Some(from), Some(until)) => {
            let last_day = until.date_naive().checked_sub_days(Days::new(1)).unwrap_or(until.date_naive());
            format!("_{}_to_{}", from.date_naive(), last_day)
        }
        _ => String::new(),
    };

    format!(
        "recharge-history_{}_{}{}_{}.csv",
        filename_safe(unit_name),
        filename_safe(business_unit_id),
        dates,
        now.timestamp_millis()
    )
}
