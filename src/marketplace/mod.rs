//! Marketplace API submission.

pub mod client;
pub mod response;

pub use client::{Marketplace, MarketplaceClient, Submission};
pub use response::{ContractVersion, SubmissionReceipt, parse_submission_response};
