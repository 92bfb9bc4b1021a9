mod announcement_response;
mod bse_client;
mod eod_client;

pub use announcement_response::{AnnouncementPage, AnnouncementRecord};
pub use bse_client::BseClient;
pub use eod_client::{BhavcopyClient, BhavcopyTable, EodSource, parse_bhavcopy};
