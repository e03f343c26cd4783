use tracing::{debug, error, info, warn};

use super::{AlbumCache, AlbumKey};
use crate::connection::Connection;
use crate::error::ConnectionResult;
use crate::queue::{CompletionMessage, CompletionQueue};
use crate::request::CommandId;
use crate::song::{is_unset, Tag};

/// Number of songs requested per search window
pub const ALBUM_CACHE_WINDOW: u32 = 1000;

/// Scans the whole catalog window by window and keeps the first song of
/// every album
#[derive(Debug, Clone)]
pub struct AlbumCacheBuilder {
    window: u32,
}

impl Default for AlbumCacheBuilder {
    fn default() -> Self {
        Self {
            window: ALBUM_CACHE_WINDOW,
        }
    }
}

impl AlbumCacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different window size, must be at least one
    pub fn with_window(window: u32) -> Self {
        Self {
            window: window.max(1),
        }
    }

    /// Build the cache and push exactly one completion message to `queue`.
    ///
    /// The cache is attached to the message on success and dropped on
    /// failure. Returns whether the build succeeded.
    pub fn create(&self, conn: &mut dyn Connection, queue: &CompletionQueue) -> bool {
        let result = self.build(conn);
        let succeeded = result.is_ok();

        let mut message = CompletionMessage::notification(CommandId::AlbumCacheCreated);
        match result {
            Ok(cache) => message = message.with_album_cache(cache),
            Err(e) => error!("Album cache update failed: {}", e),
        }
        queue.push(message);
        succeeded
    }

    /// Scan the catalog into a fresh cache
    pub fn build(&self, conn: &mut dyn Connection) -> ConnectionResult<AlbumCache> {
        info!("Creating album cache");
        let mut cache = AlbumCache::new();
        let mut start = 0u32;
        let mut total_seen = 0usize;

        loop {
            let end = start.saturating_add(self.window);
            let received = match self.scan_window(conn, &mut cache, start, end) {
                Ok(received) => received,
                Err(e) => {
                    conn.cancel();
                    return Err(e);
                }
            };
            total_seen += received;
            debug!(
                "Album cache window {}:{} returned {} songs",
                start, end, received
            );

            // A short page means the catalog is exhausted
            if received < self.window as usize {
                break;
            }
            start = end;
        }

        info!(
            "Album cache updated successfully: {} albums from {} songs",
            cache.len(),
            total_seen
        );
        Ok(cache)
    }

    /// Query one window and merge it into `cache`, returning the number of
    /// songs received
    fn scan_window(
        &self,
        conn: &mut dyn Connection,
        cache: &mut AlbumCache,
        start: u32,
        end: u32,
    ) -> ConnectionResult<usize> {
        conn.search_window(start, end)?;

        let mut received = 0;
        while let Some(song) = conn.recv_song()? {
            received += 1;
            let album = song.tag_value(Tag::Album);
            let album_artist = song.tag_value(Tag::AlbumArtist);
            if is_unset(&album) || is_unset(&album_artist) {
                warn!("Album cache, skipping \"{}\"", song.uri);
                continue;
            }
            // Later songs of an already known album are dropped
            let _ = cache.insert_if_absent(AlbumKey::new(album, album_artist), song);
        }

        conn.finish()?;
        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MemoryConnector;
    use crate::queue::Attachment;
    use crate::song::Song;

    fn song(uri: &str, album: &str, artist: &str) -> Song {
        Song::new(uri)
            .with_tag(Tag::Album, album)
            .with_tag(Tag::AlbumArtist, artist)
    }

    fn numbered(count: usize, albums: usize) -> Vec<Song> {
        (0..count)
            .map(|i| song(&format!("{i}.flac"), &format!("Album {}", i % albums), "X"))
            .collect()
    }

    #[test]
    fn test_duplicates_keep_first_song() {
        let connector = MemoryConnector::new(vec![
            song("1.flac", "A", "X"),
            song("2.flac", "A", "X"),
            song("3.flac", "B", "Y"),
        ]);

        let cache = AlbumCacheBuilder::new().build(&mut connector.open()).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("A", "X").unwrap().uri, "1.flac");
        assert_eq!(cache.get("B", "Y").unwrap().uri, "3.flac");
    }

    #[test]
    fn test_unset_tags_are_skipped() {
        let connector = MemoryConnector::new(vec![
            song("1.flac", "", "X"),
            song("2.flac", "A", "-"),
            Song::new("3.flac").with_tag(Tag::Album, "C"),
            song("4.flac", "D", "Z"),
        ]);

        let cache = AlbumCacheBuilder::new().build(&mut connector.open()).unwrap();

        assert_eq!(cache.len(), 1);
        assert!(cache.get("D", "Z").is_some());
    }

    #[test]
    fn test_exact_window_multiple_issues_extra_query() {
        let connector = MemoryConnector::new(numbered(1000, 1000));

        let cache = AlbumCacheBuilder::new().build(&mut connector.open()).unwrap();

        assert_eq!(cache.len(), 1000);
        assert_eq!(connector.stats().windows, vec![(0, 1000), (1000, 2000)]);
    }

    #[test]
    fn test_partial_page_stops_scan() {
        let connector = MemoryConnector::new(numbered(25, 7));

        let cache = AlbumCacheBuilder::with_window(10)
            .build(&mut connector.open())
            .unwrap();

        assert_eq!(cache.len(), 7);
        assert_eq!(
            connector.stats().windows,
            vec![(0, 10), (10, 20), (20, 30)]
        );
    }

    #[test]
    fn test_query_error_cancels_and_fails() {
        let connector = MemoryConnector::new(numbered(15, 15)).failing_window(2);

        let result = AlbumCacheBuilder::with_window(10).build(&mut connector.open());

        assert!(result.is_err());
        assert_eq!(connector.stats().cancels, 1);
        assert_eq!(connector.stats().windows.len(), 2);
    }

    #[test]
    fn test_create_pushes_one_message() {
        let queue = CompletionQueue::new();
        let connector = MemoryConnector::new(vec![song("1.flac", "A", "X")]);

        assert!(AlbumCacheBuilder::new().create(&mut connector.open(), &queue));
        assert_eq!(queue.len(), 1);

        let message = queue.try_pop().unwrap();
        assert_eq!(message.cmd_id, CommandId::AlbumCacheCreated);
        assert!(matches!(message.attachment, Some(Attachment::AlbumCache(ref c)) if c.len() == 1));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_create_failure_has_no_attachment() {
        let queue = CompletionQueue::new();
        let connector = MemoryConnector::new(vec![song("1.flac", "A", "X")]).failing_window(1);

        assert!(!AlbumCacheBuilder::new().create(&mut connector.open(), &queue));

        let message = queue.try_pop().unwrap();
        assert!(message.attachment.is_none());
        assert!(queue.is_empty());
    }
}
