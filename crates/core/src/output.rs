use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

use serde::Serialize;
use tokio::fs;

use crate::{error::Result, pipeline::ChapterDocument, types::Chapter};

/// Output directory for a given transcript, keyed by a hash of its path.
pub fn get_job_dir(root: &Path, transcript_path: &Path) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    transcript_path.hash(&mut hasher);
    root.join(hasher.finish().to_string())
}

pub fn get_markdown_path(dir: &Path) -> PathBuf {
    dir.join("chapters.md")
}

pub fn get_chapters_path(dir: &Path) -> PathBuf {
    dir.join("chapters.json")
}

pub fn get_cleaned_input_path(dir: &Path) -> PathBuf {
    dir.join("cleaned_input.txt")
}

/// Paths written by [`save_document`].
#[derive(Debug, Clone, Serialize)]
pub struct SavedOutputs {
    pub markdown: PathBuf,
    pub chapters: PathBuf,
    pub cleaned_input: PathBuf,
}

/// Write the markdown, the chapter JSON and the cleaned transcript into `dir`.
pub async fn save_document(document: &ChapterDocument, dir: &Path) -> Result<SavedOutputs> {
    fs::create_dir_all(dir).await?;

    let outputs = SavedOutputs {
        markdown: get_markdown_path(dir),
        chapters: get_chapters_path(dir),
        cleaned_input: get_cleaned_input_path(dir),
    };

    fs::write(&outputs.markdown, &document.markdown).await?;
    save_chapters(&document.chapters, &outputs.chapters).await?;
    fs::write(&outputs.cleaned_input, &document.cleaned_input).await?;

    Ok(outputs)
}

pub async fn save_chapters(chapters: &[Chapter], path: &Path) -> Result<()> {
    let pretty_json = serde_json::to_string_pretty(chapters)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}

pub async fn load_chapters(path: &Path) -> Result<Vec<Chapter>> {
    let json_content = fs::read_to_string(path).await?;
    let chapters: Vec<Chapter> = serde_json::from_str(&json_content)?;
    Ok(chapters)
}
