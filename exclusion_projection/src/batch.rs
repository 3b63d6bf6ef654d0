//! Batch application of a compiled projection
//!
//! Projects a sequence of documents with one shared `ParsedExclusionProjection`,
//! either on the calling thread or split across scoped worker threads. Output
//! order always matches input order.

use crate::config::compile_time::batch::{MAX_DOCUMENTS_PER_BATCH, MAX_WORKER_THREADS};
use crate::config::BatchPreferences;
use crate::logging::{self, codes};
use crate::projection::{Document, ParsedExclusionProjection};
use serde_json::Value;
use std::thread;
use std::time::{Duration, Instant};

// ============================================================================
// BATCH PROCESSING TYPES
// ============================================================================

/// Batch processing configuration
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_threads: usize,
    /// Batches smaller than this run sequentially regardless of `max_threads`
    pub parallel_threshold: usize,
    /// Stop at the first input that is not a document
    pub fail_fast: bool,
    /// Largest batch accepted, never above `MAX_DOCUMENTS_PER_BATCH`
    pub max_documents: usize,
}

impl BatchConfig {
    pub fn from_preferences(preferences: &BatchPreferences) -> Self {
        Self {
            max_threads: preferences.worker_threads.clamp(1, MAX_WORKER_THREADS),
            parallel_threshold: preferences.parallel_threshold,
            fail_fast: false,
            max_documents: MAX_DOCUMENTS_PER_BATCH,
        }
    }

    /// Effective batch size limit
    pub fn document_limit(&self) -> usize {
        self.max_documents.min(MAX_DOCUMENTS_PER_BATCH)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::from_preferences(&BatchPreferences::default())
    }
}

/// Batch processing results
#[derive(Debug, Default)]
pub struct BatchResults {
    /// Projected documents with their input index, in input order
    pub projected: Vec<(usize, Document)>,
    /// Inputs that were not documents, with their input index
    pub rejected: Vec<(usize, String)>,
    pub processing_duration: Duration,
    pub documents_processed: usize,
}

impl BatchResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_count(&self) -> usize {
        self.projected.len()
    }

    pub fn failure_count(&self) -> usize {
        self.rejected.len()
    }

    pub fn add_success(&mut self, index: usize, document: Document) {
        self.projected.push((index, document));
        self.documents_processed += 1;
    }

    pub fn add_failure(&mut self, index: usize, reason: String) {
        self.rejected.push((index, reason));
        self.documents_processed += 1;
    }

    /// Append results of a later chunk
    pub fn merge(&mut self, other: BatchResults) {
        self.projected.extend(other.projected);
        self.rejected.extend(other.rejected);
        self.documents_processed += other.documents_processed;
    }

    /// Projected documents without their indices
    pub fn into_documents(self) -> Vec<Document> {
        self.projected
            .into_iter()
            .map(|(_, document)| document)
            .collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "Batch projection completed: {} documents processed, {} projected, {} rejected, {:.2}s total",
            self.documents_processed,
            self.success_count(),
            self.failure_count(),
            self.processing_duration.as_secs_f64()
        )
    }
}

/// Batch processing errors
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Too many documents in batch: {count} (max: {max})")]
    TooManyDocuments { count: usize, max: usize },

    #[error("Worker thread error: {message}")]
    ThreadError { message: String },
}

impl BatchError {
    /// Get appropriate error code for logging system
    pub fn error_code(&self) -> codes::Code {
        match self {
            Self::TooManyDocuments { .. } => codes::batch::TOO_MANY_DOCUMENTS,
            Self::ThreadError { .. } => codes::batch::WORKER_FAILURE,
        }
    }
}

// ============================================================================
// BATCH PROCESSING
// ============================================================================

fn check_batch_size(count: usize, config: &BatchConfig) -> Result<(), BatchError> {
    let max = config.document_limit();
    if count > max {
        let error = BatchError::TooManyDocuments { count, max };
        crate::log_error!(error.error_code(), "Batch rejected", "documents" => count);
        return Err(error);
    }
    Ok(())
}

/// Project a run of inputs whose first element sits at `offset` in the batch
fn project_chunk(
    projection: &ParsedExclusionProjection,
    inputs: &[Value],
    offset: usize,
    fail_fast: bool,
) -> BatchResults {
    let mut results = BatchResults::new();

    for (local_index, input) in inputs.iter().enumerate() {
        let index = offset + local_index;
        match input {
            Value::Object(document) => {
                results.add_success(index, projection.apply_projection(document));
            }
            other => {
                let reason = format!("expected a document, found {}", value_kind(other));
                crate::log_error!(
                    codes::batch::INVALID_DOCUMENT,
                    "Input is not a document",
                    "index" => index,
                    "reason" => &reason
                );
                results.add_failure(index, reason);
                if fail_fast {
                    break;
                }
            }
        }
    }

    results
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "document",
    }
}

/// Project every input on the calling thread
pub fn apply_sequential(
    projection: &ParsedExclusionProjection,
    inputs: &[Value],
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();
    check_batch_size(inputs.len(), config)?;

    crate::log_debug!("Starting sequential batch projection", "documents" => inputs.len());

    let mut results = project_chunk(projection, inputs, 0, config.fail_fast);
    results.processing_duration = start_time.elapsed();

    crate::log_success!(
        codes::success::BATCH_COMPLETED,
        "Sequential batch projection completed",
        "documents_processed" => results.documents_processed,
        "projected" => results.success_count(),
        "rejected" => results.failure_count(),
        "duration_ms" => format!("{:.2}", results.processing_duration.as_secs_f64() * 1000.0)
    );

    Ok(results)
}

/// Project inputs on up to `config.max_threads` scoped worker threads
pub fn apply_parallel(
    projection: &ParsedExclusionProjection,
    inputs: &[Value],
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();
    check_batch_size(inputs.len(), config)?;

    let mut results = BatchResults::new();
    if inputs.is_empty() {
        return Ok(results);
    }

    let threads = config.max_threads.clamp(1, MAX_WORKER_THREADS);
    let chunk_size = calculate_chunk_size(inputs.len(), threads);

    crate::log_debug!("Parallel batch configuration",
        "documents" => inputs.len(),
        "chunk_size" => chunk_size,
        "threads" => threads
    );

    let chunk_results: Vec<thread::Result<BatchResults>> = thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .chunks(chunk_size)
            .enumerate()
            .map(|(chunk_index, chunk)| {
                let offset = chunk_index * chunk_size;
                let fail_fast = config.fail_fast;
                scope.spawn(move || project_chunk(projection, chunk, offset, fail_fast))
            })
            .collect();

        handles.into_iter().map(|handle| handle.join()).collect()
    });

    // Chunks are merged in spawn order so output order matches input order
    for chunk in chunk_results {
        let chunk = chunk.map_err(|_| {
            let error = BatchError::ThreadError {
                message: "Worker panicked during projection".to_string(),
            };
            logging::safe_log_critical(error.error_code(), &error.to_string());
            error
        })?;
        results.merge(chunk);

        if config.fail_fast && results.failure_count() > 0 {
            crate::log_warning!("Fail-fast mode enabled, stopping batch projection");
            break;
        }
    }

    results.processing_duration = start_time.elapsed();

    crate::log_success!(
        codes::success::BATCH_COMPLETED,
        "Parallel batch projection completed",
        "documents_processed" => results.documents_processed,
        "projected" => results.success_count(),
        "rejected" => results.failure_count(),
        "threads_used" => threads,
        "duration_ms" => format!("{:.2}", results.processing_duration.as_secs_f64() * 1000.0)
    );

    Ok(results)
}

/// Split work evenly, one chunk per thread
fn calculate_chunk_size(documents: usize, max_threads: usize) -> usize {
    documents.div_ceil(max_threads.max(1)).max(1)
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Project a batch, going parallel only when the batch is large enough to pay off
pub fn apply_batch(
    projection: &ParsedExclusionProjection,
    inputs: &[Value],
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    if config.max_threads <= 1 || inputs.len() < config.parallel_threshold {
        apply_sequential(projection, inputs, config)
    } else {
        apply_parallel(projection, inputs, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{ArrayRecursionPolicy, DefaultIdPolicy};
    use assert_matches::assert_matches;
    use serde_json::json;

    fn projection(spec: Value) -> ParsedExclusionProjection {
        let Value::Object(spec) = spec else {
            panic!("spec must be an object");
        };
        ParsedExclusionProjection::compile(
            &spec,
            DefaultIdPolicy::ExcludeId,
            ArrayRecursionPolicy::RecurseNestedArrays,
        )
        .unwrap()
    }

    fn config(max_threads: usize) -> BatchConfig {
        BatchConfig {
            max_threads,
            parallel_threshold: 0,
            fail_fast: false,
            max_documents: MAX_DOCUMENTS_PER_BATCH,
        }
    }

    fn inputs(count: usize) -> Vec<Value> {
        (0..count)
            .map(|i| json!({"_id": i, "secret": i, "n": i}))
            .collect()
    }

    #[test]
    fn test_sequential_projection() {
        let projection = projection(json!({"secret": 0}));
        let results = apply_sequential(&projection, &inputs(3), &config(1)).unwrap();

        assert_eq!(results.success_count(), 3);
        assert_eq!(results.failure_count(), 0);
        let documents = results.into_documents();
        assert_eq!(Value::Object(documents[2].clone()), json!({"n": 2}));
    }

    #[test]
    fn test_parallel_preserves_order() {
        let projection = projection(json!({"secret": 0}));
        let inputs = inputs(103);

        let results = apply_parallel(&projection, &inputs, &config(4)).unwrap();
        assert_eq!(results.documents_processed, 103);

        for (position, (index, document)) in results.projected.iter().enumerate() {
            assert_eq!(position, *index);
            assert_eq!(Value::Object(document.clone()), json!({"n": position}));
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let projection = projection(json!({"a.b": 0}));
        let inputs: Vec<Value> = (0..50)
            .map(|i| json!({"_id": i, "a": [{"b": i, "c": i}, [{"b": i}]]}))
            .collect();

        let sequential = apply_sequential(&projection, &inputs, &config(1))
            .unwrap()
            .into_documents();
        let parallel = apply_parallel(&projection, &inputs, &config(8))
            .unwrap()
            .into_documents();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_non_documents_are_rejected() {
        let projection = projection(json!({"secret": 0}));
        let inputs = vec![json!({"secret": 1, "k": 1}), json!(3), json!([1]), json!({"k": 2})];

        let results = apply_sequential(&projection, &inputs, &config(1)).unwrap();
        assert_eq!(results.success_count(), 2);
        let rejected: Vec<usize> = results.rejected.iter().map(|(i, _)| *i).collect();
        assert_eq!(rejected, vec![1, 2]);
        assert!(results.rejected[0].1.contains("number"));
    }

    #[test]
    fn test_fail_fast_stops_at_first_rejection() {
        let projection = projection(json!({"secret": 0}));
        let inputs = vec![json!({"k": 1}), json!(null), json!({"k": 2})];
        let config = BatchConfig {
            fail_fast: true,
            ..config(1)
        };

        let results = apply_sequential(&projection, &inputs, &config).unwrap();
        assert_eq!(results.documents_processed, 2);
        assert_eq!(results.failure_count(), 1);
    }

    #[test]
    fn test_apply_batch_dispatch() {
        let projection = projection(json!({"secret": 0}));
        let config = BatchConfig {
            max_threads: 4,
            parallel_threshold: 1000,
            fail_fast: false,
            max_documents: MAX_DOCUMENTS_PER_BATCH,
        };

        let results = apply_batch(&projection, &inputs(10), &config).unwrap();
        assert_eq!(results.success_count(), 10);

        let empty = apply_batch(&projection, &[], &config).unwrap();
        assert_eq!(empty.documents_processed, 0);
    }

    #[test]
    fn test_chunk_size_calculation() {
        assert_eq!(calculate_chunk_size(100, 4), 25);
        assert_eq!(calculate_chunk_size(10, 4), 3);
        assert_eq!(calculate_chunk_size(1, 4), 1);
        assert_eq!(calculate_chunk_size(0, 4), 1);
    }

    #[test]
    fn test_batch_config_from_preferences() {
        let preferences = BatchPreferences {
            worker_threads: MAX_WORKER_THREADS + 10,
            parallel_threshold: 7,
        };
        let config = BatchConfig::from_preferences(&preferences);
        assert_eq!(config.max_threads, MAX_WORKER_THREADS);
        assert_eq!(config.parallel_threshold, 7);
        assert!(!config.fail_fast);
        assert_eq!(config.document_limit(), MAX_DOCUMENTS_PER_BATCH);

        let raised = BatchConfig {
            max_documents: MAX_DOCUMENTS_PER_BATCH + 1,
            ..config
        };
        assert_eq!(raised.document_limit(), MAX_DOCUMENTS_PER_BATCH);
    }

    #[test]
    fn test_too_many_documents() {
        let projection = projection(json!({"secret": 0}));
        let limited = BatchConfig {
            max_documents: 3,
            ..config(2)
        };

        assert!(apply_sequential(&projection, &inputs(3), &limited).is_ok());
        for result in [
            apply_sequential(&projection, &inputs(4), &limited),
            apply_parallel(&projection, &inputs(4), &limited),
        ] {
            let error = result.unwrap_err();
            assert_matches!(error, BatchError::TooManyDocuments { count: 4, max: 3 });
            assert_eq!(error.error_code(), codes::batch::TOO_MANY_DOCUMENTS);
        }
    }

    #[test]
    fn test_summary() {
        let mut results = BatchResults::new();
        results.add_success(0, Document::new());
        results.add_failure(1, "bad".to_string());
        assert!(results.summary().contains("2 documents processed"));
    }
}
