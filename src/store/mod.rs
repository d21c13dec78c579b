use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{parse_context, read_context, write_context};
use crate::rating::CompetitorRating;
use crate::season::{SeasonArchive, SeasonContext};

/// JSON snapshot directory:
///
/// ```text
/// <root>/ratings/<competitor>.json
/// <root>/season.json
/// <root>/archives/season_<n>.json
/// ```
pub struct SnapshotStore {
    root: PathBuf,
    ratings_dir: PathBuf,
    archives_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let ratings_dir = root.join("ratings");
        let archives_dir = root.join("archives");

        fs::create_dir_all(&ratings_dir).context("Failed to create ratings directory")?;
        fs::create_dir_all(&archives_dir).context("Failed to create archives directory")?;

        Ok(Self {
            root,
            ratings_dir,
            archives_dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn save_rating(&self, rating: &CompetitorRating) -> Result<()> {
        let path = self.build_rating_path(&rating.id);
        self.write_json(&path, rating)?;
        debug!("Saved rating snapshot: {}", path.display());
        Ok(())
    }

    pub fn save_ratings<'a, I>(&self, ratings: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a CompetitorRating>,
    {
        let mut saved = 0;
        for rating in ratings {
            self.save_rating(rating)?;
            saved += 1;
        }
        info!("Saved {} rating snapshots to {}", saved, self.ratings_dir.display());
        Ok(saved)
    }

    pub fn load_rating(&self, competitor_id: &str) -> Result<Option<CompetitorRating>> {
        self.read_json_opt(&self.build_rating_path(competitor_id))
    }

    /// Every stored rating, ordered by file name.
    pub fn load_ratings(&self) -> Result<Vec<CompetitorRating>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.ratings_dir)
            .with_context(|| read_context(&self.ratings_dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut ratings = Vec::with_capacity(paths.len());
        for path in paths {
            if let Some(rating) = self.read_json_opt(&path)? {
                ratings.push(rating);
            }
        }
        info!("Loaded {} rating snapshots from {}", ratings.len(), self.ratings_dir.display());
        Ok(ratings)
    }

    pub fn save_season(&self, season: &SeasonContext) -> Result<()> {
        self.write_json(&self.build_season_path(), season)
    }

    pub fn load_season(&self) -> Result<Option<SeasonContext>> {
        self.read_json_opt(&self.build_season_path())
    }

    pub fn save_archive(&self, archive: &SeasonArchive) -> Result<()> {
        let path = self.build_archive_path(archive.season);
        self.write_json(&path, archive)?;
        info!("Archived season {} to {}", archive.season, path.display());
        Ok(())
    }

    pub fn load_archive(&self, season: u32) -> Result<Option<SeasonArchive>> {
        self.read_json_opt(&self.build_archive_path(season))
    }

    // --- Helper Methods ---

    fn build_rating_path(&self, competitor_id: &str) -> PathBuf {
        self.ratings_dir.join(format!("{}.json", encode_file_stem(competitor_id)))
    }

    fn build_season_path(&self) -> PathBuf {
        self.root.join("season.json")
    }

    fn build_archive_path(&self, season: u32) -> PathBuf {
        self.archives_dir.join(format!("season_{}.json", season))
    }

    fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data).context("Failed to serialize snapshot")?;
        fs::write(path, json).with_context(|| write_context(path))?;
        Ok(())
    }

    fn read_json_opt<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(path).with_context(|| read_context(path))?;
        let data = serde_json::from_str(&json).with_context(|| parse_context(path, &json))?;
        Ok(Some(data))
    }
}

/// Keeps ASCII alphanumerics and `-`; every other byte, `_` included, becomes
/// `_XX` hex so distinct ids never share a file.
fn encode_file_stem(competitor_id: &str) -> String {
    let mut stem = String::with_capacity(competitor_id.len());
    for byte in competitor_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{:02X}", byte));
        }
    }
    stem
}
