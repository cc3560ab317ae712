pub mod generate;
pub mod init;
pub mod list_models;
pub mod report;
pub mod take;
pub mod validate;
