/// Conversion of records into polars data frames and CSV export of frames
pub mod dataframe;
/// Run manifest to detect resuming with a changed configuration
pub mod manifest;
/// CSV reading and (appending) writing of records
pub mod records_csv;
