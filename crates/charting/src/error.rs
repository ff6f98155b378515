use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Chart persistence failed: {0}")]
    Persist(String),
}
