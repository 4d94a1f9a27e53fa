#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tinypng_cli::cli::BatchArgs;
use tinypng_cli::commands::RunContext;
use tinypng_cli::config::ClientSettings;

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

/// Writes `count` PNG-named files whose bodies are `image-<index>`.
pub fn create_numbered_images(dir: &Path, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("img{}.png", i));
            File::create(&path)
                .unwrap()
                .write_all(format!("image-{}", i).as_bytes())
                .unwrap();
            path
        })
        .collect()
}

pub fn create_test_image_files(temp_dir: &Path) -> Vec<PathBuf> {
    let names = ["test.jpg", "test.png", "test.webp", "test.txt"];
    names
        .iter()
        .map(|name| {
            let path = temp_dir.join(name);
            File::create(&path)
                .unwrap()
                .write_all(b"fake image data")
                .unwrap();
            path
        })
        .collect()
}

pub fn create_nested_directory_structure(temp_dir: &Path) -> PathBuf {
    let subdir = temp_dir.join("subdir");
    std::fs::create_dir(&subdir).unwrap();

    File::create(subdir.join("nested.jpg"))
        .unwrap()
        .write_all(b"nested image")
        .unwrap();
    File::create(subdir.join("nested.txt"))
        .unwrap()
        .write_all(b"nested text")
        .unwrap();

    subdir
}

/// Body of a successful `/shrink` response.
pub fn shrink_body(input_size: u64, output_size: u64, mime: &str) -> Value {
    json!({
        "input": { "size": input_size, "type": mime },
        "output": { "size": output_size, "type": mime, "width": 100, "height": 100, "ratio": 0.5 }
    })
}

pub fn context_for(base_url: &str) -> RunContext {
    RunContext {
        settings: ClientSettings {
            api_base: base_url.to_string(),
            web_base: base_url.to_string(),
            ..ClientSettings::with_timeout_secs(5)
        },
        api_key: Some("test-key".to_string()),
        quiet: true,
    }
}

pub fn batch_args(path: &Path, output: Option<PathBuf>) -> BatchArgs {
    BatchArgs {
        path: path.to_string_lossy().into_owned(),
        output,
        max_upload: 4,
        recursive: false,
        extensions: vec!["png".into(), "jpg".into(), "jpeg".into(), "webp".into()],
    }
}

pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    files.sort();
    files
}
