//! Shared fakes for the pipeline integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;

use tubely_core::config::PipelineConfig;
use tubely_core::Config;
use tubely_processing::video::remux_output_path;
use tubely_processing::{
    IngestPipeline, MediaProbe, MediaRemuxer, ProbeError, RemuxError, ScratchFile,
    VideoDimensions,
};
use tubely_storage::{
    create_resolver, ByteReader, Storage, StorageBackend, StorageError, StorageResult,
};

pub const TEST_BUCKET: &str = "tubely-test";

/// Probe that reports fixed dimensions, or no streams at all.
pub struct FakeProbe {
    dimensions: Option<VideoDimensions>,
    calls: AtomicUsize,
}

impl FakeProbe {
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            dimensions: Some(VideoDimensions { width, height }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn without_streams() -> Self {
        Self {
            dimensions: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaProbe for FakeProbe {
    async fn dimensions(&self, path: &Path) -> Result<VideoDimensions, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "probe ran after the scratch file was removed");
        self.dimensions.ok_or(ProbeError::NoStreams)
    }
}

/// Remuxer that copies its input, or writes partial output and fails like ffmpeg would.
pub struct FakeRemuxer {
    failure: Option<String>,
    calls: AtomicUsize,
}

impl FakeRemuxer {
    pub fn copying() -> Self {
        Self {
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(stderr: &str) -> Self {
        Self {
            failure: Some(stderr.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaRemuxer for FakeRemuxer {
    async fn remux(&self, input: &Path) -> Result<ScratchFile, RemuxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let output = ScratchFile::adopt(remux_output_path(input));

        match self.failure {
            Some(ref stderr) => {
                tokio::fs::write(output.path(), b"partial")
                    .await
                    .map_err(RemuxError::MissingOutput)?;
                Err(RemuxError::Failed {
                    exit_code: Some(1),
                    stderr: stderr.clone(),
                })
            }
            None => {
                tokio::fs::copy(input, output.path())
                    .await
                    .map_err(RemuxError::MissingOutput)?;
                Ok(output)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct PutRecord {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// In-memory storage that records every put.
#[derive(Default)]
pub struct RecordingStorage {
    puts: Mutex<Vec<PutRecord>>,
    fail_puts: bool,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            puts: Mutex::new(Vec::new()),
            fail_puts: true,
        }
    }

    pub fn puts(&self) -> Vec<PutRecord> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn put_stream(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        mut reader: ByteReader,
    ) -> StorageResult<u64> {
        if self.fail_puts {
            return Err(StorageError::UploadFailed("access denied".to_string()));
        }
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        let size = data.len() as u64;
        self.puts.lock().unwrap().push(PutRecord {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            data,
        });
        Ok(size)
    }

    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        Ok(format!(
            "https://{}.s3.us-east-1.amazonaws.com/{}?X-Amz-Expires={}&X-Amz-Signature=fake",
            bucket,
            key,
            expires_in.as_secs()
        ))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://{}.s3.us-east-1.amazonaws.com/{}", bucket, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

/// Pipeline wired to fakes, with its own scratch directory.
pub struct TestPipeline {
    pub pipeline: IngestPipeline,
    pub storage: Arc<RecordingStorage>,
    pub probe: Arc<FakeProbe>,
    pub remuxer: Arc<FakeRemuxer>,
    pub scratch: TempDir,
}

impl TestPipeline {
    pub fn scratch_entries(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.scratch.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }
}

pub fn test_config(scratch_dir: &Path, url_mode: &str) -> Config {
    let scratch = scratch_dir.to_string_lossy().to_string();
    let url_mode = url_mode.to_string();
    let config = PipelineConfig::from_lookup(move |name| match name {
        "S3_BUCKET" => Some(TEST_BUCKET.to_string()),
        "AWS_REGION" => Some("us-east-1".to_string()),
        "VIDEO_URL_MODE" => Some(url_mode.clone()),
        "SCRATCH_DIR" => Some(scratch.clone()),
        _ => None,
    })
    .unwrap();
    Config(Box::new(config))
}

pub fn build_pipeline(
    url_mode: &str,
    probe: FakeProbe,
    remuxer: FakeRemuxer,
    storage: RecordingStorage,
) -> TestPipeline {
    let scratch = TempDir::new().unwrap();
    let config = test_config(scratch.path(), url_mode);

    let storage = Arc::new(storage);
    let probe = Arc::new(probe);
    let remuxer = Arc::new(remuxer);

    let resolver = create_resolver(&config, storage.clone());
    let pipeline = IngestPipeline::from_config(&config, storage.clone(), resolver)
        .with_probe(probe.clone())
        .with_remuxer(remuxer.clone());

    TestPipeline {
        pipeline,
        storage,
        probe,
        remuxer,
        scratch,
    }
}
