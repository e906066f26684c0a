use thiserror::Error;

pub type SalesPgmResult<T> = Result<T, SalesPgmError>;

#[derive(Error, Debug)]
pub enum SalesPgmError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Required column '{column}' is missing from the input sheet")]
    MissingColumn { column: String },

    #[error("Configuration error: {0}")]
    Config(String),
}
