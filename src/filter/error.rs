use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid date for '{field}': {value}")]
    InvalidDate { field: &'static str, value: String },
}
