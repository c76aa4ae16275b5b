//! # Codec Registry
//!
//! Building a `RowCodec` walks the whole field tree (operators, nested group
//! codecs, the layout plan), so codecs are built once per record type and
//! shared as `Arc<RowCodec>`.
//!
//! ## Concurrency
//!
//! The map sits behind a `parking_lot::RwLock`. Lookups take the read lock; a
//! miss builds the codec without holding any lock, then re-checks under the
//! write lock so concurrent first uses agree on one instance.
//!
//! ## Keys
//!
//! Entries are keyed by record type name. A lookup only hits when the cached
//! codec was built for the same `Arc<RecordType>`; a different type reusing a
//! name replaces the entry.
//!
//! ```ignore
//! let codec = CodecRegistry::global().codec_for(&person)?;
//! let bytes = codec.encode(&values)?;
//! ```

use std::sync::{Arc, OnceLock};

use eyre::Result;
use hashbrown::HashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::config::CodecOptions;
use crate::records::codec::RowCodec;
use crate::types::RecordType;

static GLOBAL_REGISTRY: OnceLock<CodecRegistry> = OnceLock::new();

#[derive(Debug, Default)]
pub struct CodecRegistry {
    options: CodecOptions,
    codecs: RwLock<HashMap<String, Arc<RowCodec>>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CodecOptions) -> Self {
        Self {
            options,
            codecs: RwLock::new(HashMap::new()),
        }
    }

    /// Process-wide registry with default options.
    pub fn global() -> &'static CodecRegistry {
        GLOBAL_REGISTRY.get_or_init(CodecRegistry::new)
    }

    pub fn options(&self) -> CodecOptions {
        self.options
    }

    pub fn codec_for(&self, record_type: &Arc<RecordType>) -> Result<Arc<RowCodec>> {
        if let Some(codec) = self.lookup(record_type) {
            return Ok(codec);
        }

        let built = Arc::new(RowCodec::new(record_type.clone(), self.options)?);

        let mut codecs = self.codecs.write();
        if let Some(existing) = codecs.get(record_type.name()) {
            if Arc::ptr_eq(existing.record_type(), record_type) {
                return Ok(existing.clone());
            }
            debug!(
                record_type = record_type.name(),
                "replacing codec of a different type with the same name"
            );
        }
        debug!(
            record_type = record_type.name(),
            fields = record_type.field_count(),
            header_len = built.header_len(),
            "built row codec"
        );
        codecs.insert(record_type.name().to_string(), built.clone());
        Ok(built)
    }

    fn lookup(&self, record_type: &Arc<RecordType>) -> Option<Arc<RowCodec>> {
        let codecs = self.codecs.read();
        codecs
            .get(record_type.name())
            .filter(|codec| Arc::ptr_eq(codec.record_type(), record_type))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.codecs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.read().is_empty()
    }

    pub fn clear(&self) {
        self.codecs.write().clear();
    }
}
