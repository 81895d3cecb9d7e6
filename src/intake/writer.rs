//! Row writes to the detail and summary worksheets

use crate::config::LayoutConfig;
use crate::core::error::{Destination, WriteError};
use crate::core::order::OrderRecord;
use crate::core::row::CellValue;
use crate::core::service::Spreadsheet;
use tracing::debug;

/// Appends an order to both destination worksheets
#[derive(Debug, Clone)]
pub struct RecordWriter {
    detail_sheet: String,
    summary_sheet: String,
    layouts: LayoutConfig,
    item_label: String,
}

impl RecordWriter {
    pub fn new(
        detail_sheet: impl Into<String>,
        summary_sheet: impl Into<String>,
        layouts: LayoutConfig,
        item_label: impl Into<String>,
    ) -> Self {
        Self {
            detail_sheet: detail_sheet.into(),
            summary_sheet: summary_sheet.into(),
            layouts,
            item_label: item_label.into(),
        }
    }

    pub fn worksheet(&self, destination: Destination) -> &str {
        match destination {
            Destination::Detail => &self.detail_sheet,
            Destination::Summary => &self.summary_sheet,
        }
    }

    /// Cells of the row destined for `destination`
    pub fn row(&self, destination: Destination, record: &OrderRecord) -> Vec<CellValue> {
        let layout = match destination {
            Destination::Detail => &self.layouts.detail,
            Destination::Summary => &self.layouts.summary,
        };
        layout.project(record, &self.item_label)
    }

    /// Append one row to a single destination
    pub async fn append(
        &self,
        sheet: &dyn Spreadsheet,
        destination: Destination,
        record: &OrderRecord,
    ) -> Result<(), WriteError> {
        let worksheet = self.worksheet(destination);
        let cells = self.row(destination, record);
        debug!(
            destination = destination.as_str(),
            worksheet,
            cells = cells.len(),
            "appending row"
        );

        sheet
            .append_row(worksheet, cells)
            .await
            .map_err(|e| e.into_write_error(destination, worksheet))
    }

    /// Append the detail row, then the summary row
    ///
    /// A failed detail write stops before the summary. A failed summary write
    /// leaves the detail row in place.
    pub async fn write(
        &self,
        sheet: &dyn Spreadsheet,
        record: &OrderRecord,
    ) -> Result<(), WriteError> {
        self.append(sheet, Destination::Detail, record).await?;
        self.append(sheet, Destination::Summary, record).await
    }
}
