//! Deduplicated album cache keyed on (Album, AlbumArtist)

mod builder;

pub use builder::{AlbumCacheBuilder, ALBUM_CACHE_WINDOW};

use serde::Serialize;
use std::collections::btree_map::{BTreeMap, Entry};
use std::fmt;

use crate::song::{Song, Tag};

/// Structured album key, compared field by field so that tag values
/// containing the display separator can not collide
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AlbumKey {
    pub album: String,
    pub album_artist: String,
}

impl AlbumKey {
    pub fn new(album: impl Into<String>, album_artist: impl Into<String>) -> Self {
        Self {
            album: album.into(),
            album_artist: album_artist.into(),
        }
    }
}

impl fmt::Display for AlbumKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.album, self.album_artist)
    }
}

/// One row of the cache, flattened for output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumSummary {
    pub album: String,
    pub album_artist: String,
    pub uri: String,
    pub date: Option<String>,
}

/// Mapping from album key to the first song seen for that album
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlbumCache {
    albums: BTreeMap<AlbumKey, Song>,
}

impl AlbumCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `song` unless the key is already present.
    ///
    /// Returns the song back when it was rejected so the caller decides what
    /// to do with it.
    pub fn insert_if_absent(&mut self, key: AlbumKey, song: Song) -> Result<(), Song> {
        match self.albums.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(song);
                Ok(())
            }
            Entry::Occupied(_) => Err(song),
        }
    }

    pub fn get(&self, album: &str, album_artist: &str) -> Option<&Song> {
        self.albums.get(&AlbumKey::new(album, album_artist))
    }

    pub fn contains_key(&self, key: &AlbumKey) -> bool {
        self.albums.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&AlbumKey, &Song)> {
        self.albums.iter()
    }

    pub fn summaries(&self) -> Vec<AlbumSummary> {
        self.albums
            .iter()
            .map(|(key, song)| AlbumSummary {
                album: key.album.clone(),
                album_artist: key.album_artist.clone(),
                uri: song.uri.clone(),
                date: song.tags.get(&Tag::Date).and_then(|d| d.first().cloned()),
            })
            .collect()
    }
}

impl IntoIterator for AlbumCache {
    type Item = (AlbumKey, Song);
    type IntoIter = std::collections::btree_map::IntoIter<AlbumKey, Song>;

    fn into_iter(self) -> Self::IntoIter {
        self.albums.into_iter()
    }
}
