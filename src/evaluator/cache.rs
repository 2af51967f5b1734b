// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Compiled field accessors and their process-wide cache
//!
//! An [`Accessor`] is the sequence of field indices a path walks, computed
//! once from static schemas. The [`AccessorCache`] keys accessors by
//! `(starting schema, absolute flag, path)`. The key space is bounded by the
//! distinct field references in the program's rule tags, so entries are
//! never evicted.

use super::error::ResolveError;
use crate::ast::FieldPath;
use crate::model::{Record, Schema, Shape, Value};
use dashmap::DashMap;
use log::{debug, trace};
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Precomputed walk from a struct to one of its (nested) fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    path: String,
    steps: SmallVec<[usize; 4]>,
}

impl Accessor {
    /// Compile `path` against `schema`
    ///
    /// Fails if a segment names no field, or if the path continues past a
    /// field that is not a nested struct.
    pub fn compile(schema: &'static Schema, path: &FieldPath) -> Result<Self, ResolveError> {
        let display = path.to_string();
        let mut steps = SmallVec::with_capacity(path.segments.len());
        let mut current = schema;
        let last = path.segments.len().saturating_sub(1);

        for (i, segment) in path.segments.iter().enumerate() {
            let index =
                current
                    .field_index(segment)
                    .ok_or_else(|| ResolveError::UnknownField {
                        path: display.clone(),
                        field: segment.clone(),
                        record: current.name,
                    })?;
            steps.push(index);

            if i == last {
                break;
            }
            match (current.fields[index].shape)() {
                Shape::Record(next) => current = next,
                Shape::Blob => {
                    return Err(ResolveError::BlobTraversal {
                        path: display,
                        field: segment.clone(),
                    });
                }
                shape @ Shape::Scalar => {
                    return Err(ResolveError::ScalarTraversal {
                        path: display,
                        field: segment.clone(),
                        kind: shape.kind(),
                    });
                }
            }
        }

        debug!("compiled accessor {display} on {} -> {steps:?}", schema.name);
        Ok(Self {
            path: display,
            steps,
        })
    }

    /// Path as written, with its `$.` or `.` prefix
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Field indices walked, outermost first
    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    /// Walk from `start`, dereferencing nested structs along the way
    pub fn resolve<'a>(&self, start: &'a dyn Record) -> Result<Value<'a>, ResolveError> {
        let mut current = start;
        let Some((&last, intermediate)) = self.steps.split_last() else {
            return Ok(Value::Record(start));
        };

        for &index in intermediate {
            match current.field(index) {
                Value::Record(next) => current = next,
                Value::Null => {
                    return Err(ResolveError::NilPointer {
                        path: self.path.clone(),
                        field: field_name(current, index),
                    });
                }
                other => {
                    return Err(ResolveError::ScalarTraversal {
                        path: self.path.clone(),
                        field: field_name(current, index),
                        kind: other.type_name(),
                    });
                }
            }
        }
        Ok(current.field(last))
    }
}

fn field_name(record: &dyn Record, index: usize) -> String {
    record
        .schema()
        .field(index)
        .map_or_else(|| index.to_string(), |f| f.name.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AccessorKey {
    schema: usize,
    absolute: bool,
    path: String,
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Compiled accessors held
    pub entries: usize,
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that compiled a new accessor
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Concurrent, never-evicting accessor cache
///
/// Threads racing to compile the same key all produce equal accessors; the
/// first insert wins and the rest are dropped. Compilation failures are not
/// cached.
#[derive(Debug, Default)]
pub struct AccessorCache {
    entries: DashMap<AccessorKey, Arc<Accessor>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AccessorCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the accessor for `path` starting at `schema`, compiling on a miss
    pub fn get_or_compile(
        &self,
        schema: &'static Schema,
        path: &FieldPath,
    ) -> Result<Arc<Accessor>, ResolveError> {
        let key = AccessorKey {
            schema: schema.id(),
            absolute: path.absolute,
            path: path.joined(),
        };

        if let Some(accessor) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!("accessor cache hit for {path} on {}", schema.name);
            return Ok(Arc::clone(accessor.value()));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let compiled = Arc::new(Accessor::compile(schema, path)?);
        Ok(Arc::clone(self.entries.entry(key).or_insert(compiled).value()))
    }

    /// Number of cached accessors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
