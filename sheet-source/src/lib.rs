//! Read-only access to spreadsheet tabs.
//!
//! The report pipeline needs exactly one operation from the spreadsheet:
//! fetch every cell of a named tab as a 2-D grid whose first row holds the
//! headers. [`SheetSource`] captures that seam, and [`GoogleSheetsClient`]
//! implements it over the Sheets v4 `values` endpoint.

mod errors;
pub mod google;

use std::future::Future;

use serde_json::Value;

pub use errors::{SheetError, SheetResult};
pub use google::{GoogleSheetsClient, ServiceAccountKey, SheetsConfig};

/// Raw cell grid as returned by the store. Row 0 is the header row; rows may
/// be ragged because trailing empty cells are omitted by the API.
pub type Grid = Vec<Vec<Value>>;

/// A read-only tabular store addressed by sheet name.
pub trait SheetSource: Send + Sync {
    /// Fetches all values of `sheet_name`. An empty tab yields an empty grid.
    fn fetch_grid(&self, sheet_name: &str) -> impl Future<Output = SheetResult<Grid>> + Send;
}
