use crate::config::{ConnectionParams, SharedState};
use crate::song::TagTypes;

/// Worker-private copy of everything a worker may read from the shared state.
///
/// Taken once at spawn time and owned by the worker; later changes to the
/// [`SharedState`] are not visible through it.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSnapshot {
    /// Smart playlists are only usable when the server supports playlists
    pub smartpls: bool,
    pub smartpls_sort: String,
    pub smartpls_prefix: String,
    pub tag_disc_empty_is_first: bool,
    pub smartpls_generate_tag_types: TagTypes,
    /// Workers always run in the default partition
    pub partition: String,
    pub mpd: ConnectionParams,
    /// May point to another server than `mpd`
    pub stickerdb: ConnectionParams,
}

impl WorkerSnapshot {
    pub fn capture(state: &SharedState) -> Self {
        Self {
            smartpls: state.smartpls && state.features.playlists,
            smartpls_sort: state.smartpls_sort.clone(),
            smartpls_prefix: state.smartpls_prefix.clone(),
            tag_disc_empty_is_first: state.tag_disc_empty_is_first,
            smartpls_generate_tag_types: state.smartpls_generate_tag_types.clone(),
            partition: state.partition.clone(),
            mpd: state.mpd.clone(),
            stickerdb: state.stickerdb.clone(),
        }
    }
}
