// Integration test utilities and common code
// WHY: Centralized utilities avoid duplication across integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use readsync::CharacterAlignment;

pub const STORY: &str = "The Fox and the River\n\n\
Once upon a time, a small fox lived near the river. Dr. Owl watched him every morning.\n\n\
\"Can you swim?\" asked the owl. The fox smiled, and jumped in!\n\n\
The water was cold. It was 3.5 degrees, maybe less. He laughed anyway.";

/// Test fixture helper for creating temporary directories with story files
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub root_path: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root_path = temp_dir.path().to_path_buf();
        Self { temp_dir, root_path }
    }

    /// Write a file relative to the fixture root, creating parents
    pub fn create_file<P: AsRef<Path>>(&self, relative_path: P, content: &str) -> PathBuf {
        let file_path = self.root_path.join(relative_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }
}

/// Alignment giving every character of `text` the same duration
pub fn uniform_alignment(text: &str, ms_per_char: u64) -> CharacterAlignment {
    let characters: Vec<String> = text.chars().map(|c| c.to_string()).collect();
    let starts = (0..characters.len())
        .map(|i| (i as u64 * ms_per_char) as f64 / 1000.0)
        .collect();
    let ends = (0..characters.len())
        .map(|i| ((i as u64 + 1) * ms_per_char) as f64 / 1000.0)
        .collect();
    CharacterAlignment {
        characters,
        character_start_times_seconds: starts,
        character_end_times_seconds: ends,
    }
}

/// Alignment with pauses after sentence punctuation, closer to real narration
pub fn paced_alignment(text: &str) -> CharacterAlignment {
    let mut characters = Vec::new();
    let mut starts = Vec::new();
    let mut ends = Vec::new();
    let mut cursor_ms = 0u64;
    for ch in text.chars() {
        let duration = match ch {
            '.' | '!' | '?' => 250,
            ',' => 120,
            c if c.is_whitespace() => 40,
            _ => 70,
        };
        characters.push(ch.to_string());
        starts.push(cursor_ms as f64 / 1000.0);
        ends.push((cursor_ms + duration) as f64 / 1000.0);
        cursor_ms += duration;
    }
    CharacterAlignment {
        characters,
        character_start_times_seconds: starts,
        character_end_times_seconds: ends,
    }
}
