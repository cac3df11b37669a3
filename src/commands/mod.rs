pub mod add;
pub mod edit;
pub mod export;
pub mod import;
pub mod list;
pub mod recovery;
pub mod reindex;
pub mod remove;
pub mod search;
pub mod status;
