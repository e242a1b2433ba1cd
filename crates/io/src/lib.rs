// File I/O operations

pub mod error;
pub mod export;
pub mod snapshot;

pub use error::IoError;
pub use export::CsvExport;
pub use snapshot::ProjectSnapshot;
