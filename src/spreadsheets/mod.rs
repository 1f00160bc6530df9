pub mod export_xlsx;

pub use export_xlsx::{export_partition_xlsx, money, ExportContext};
