//! CSV serialization of record batches

use crate::extract::ListingRecord;
use crate::output::traits::OutputResult;
use chrono::{DateTime, TimeZone};
use std::io::Write;

/// Byte order mark so spreadsheet tools detect UTF-8
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Serializes `records` as a UTF-8 CSV document with a header row
///
/// Columns follow [`ListingRecord::COLUMNS`]. Null values become empty
/// cells and image URLs are joined with `|`.
pub fn records_to_csv(records: &[ListingRecord]) -> OutputResult<Vec<u8>> {
    let mut buffer = Vec::with_capacity(UTF8_BOM.len() + records.len() * 512);
    buffer.write_all(UTF8_BOM)?;

    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(ListingRecord::COLUMNS)?;
        for record in records {
            writer.write_record(record.to_csv_row())?;
        }
        writer.flush()?;
    }

    Ok(buffer)
}

/// File name of batch `batch_number` started at `timestamp`
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use otomoto_harvester::output::batch_file_name;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 7, 14, 5, 9).unwrap();
/// assert_eq!(batch_file_name(&at, 2), "dump_20240307_140509_batch_2.csv");
/// ```
pub fn batch_file_name<Tz: TimeZone>(timestamp: &DateTime<Tz>, batch_number: u32) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "dump_{}_batch_{}.csv",
        timestamp.format("%Y%m%d_%H%M%S"),
        batch_number
    )
}
