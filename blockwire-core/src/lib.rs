pub mod error;
pub mod schema;
pub mod row;
pub mod wire;
pub mod tagged;
pub mod metadata;
pub mod block;
pub mod config;

pub use error::{Error, Result};
pub use schema::{Schema, Field, DataType};
pub use row::{Value, RowKind, MappingRow, SequenceRow};
pub use tagged::{TaggedRecord, TaggedWriter};
pub use metadata::BlockMetadata;
pub use block::{Block, BlockBuilder, BlockData};
pub use config::{BlockwireConfig, BlockConfig, LoggingConfig};
