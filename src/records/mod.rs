mod record;
mod writer;

pub use record::{Phase, RECORD_VERSION, RoundRecord};
pub use writer::{RecordWriter, read_records, read_records_from_path};
