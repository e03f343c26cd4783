use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Value returned by [`Song::tag_value`] when a tag is not set
pub const TAG_PLACEHOLDER: &str = "-";

/// Catalog tags the worker knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tag {
    Artist,
    ArtistSort,
    Album,
    AlbumSort,
    AlbumArtist,
    AlbumArtistSort,
    Title,
    Track,
    Name,
    Genre,
    Date,
    OriginalDate,
    Composer,
    Performer,
    Conductor,
    Work,
    Grouping,
    Comment,
    Disc,
    Label,
    MusicBrainzArtistId,
    MusicBrainzAlbumId,
    MusicBrainzAlbumArtistId,
    MusicBrainzTrackId,
    MusicBrainzReleaseTrackId,
}

impl Tag {
    pub const ALL: [Tag; 25] = [
        Tag::Artist,
        Tag::ArtistSort,
        Tag::Album,
        Tag::AlbumSort,
        Tag::AlbumArtist,
        Tag::AlbumArtistSort,
        Tag::Title,
        Tag::Track,
        Tag::Name,
        Tag::Genre,
        Tag::Date,
        Tag::OriginalDate,
        Tag::Composer,
        Tag::Performer,
        Tag::Conductor,
        Tag::Work,
        Tag::Grouping,
        Tag::Comment,
        Tag::Disc,
        Tag::Label,
        Tag::MusicBrainzArtistId,
        Tag::MusicBrainzAlbumId,
        Tag::MusicBrainzAlbumArtistId,
        Tag::MusicBrainzTrackId,
        Tag::MusicBrainzReleaseTrackId,
    ];

    /// Name of the tag as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Artist => "Artist",
            Tag::ArtistSort => "ArtistSort",
            Tag::Album => "Album",
            Tag::AlbumSort => "AlbumSort",
            Tag::AlbumArtist => "AlbumArtist",
            Tag::AlbumArtistSort => "AlbumArtistSort",
            Tag::Title => "Title",
            Tag::Track => "Track",
            Tag::Name => "Name",
            Tag::Genre => "Genre",
            Tag::Date => "Date",
            Tag::OriginalDate => "OriginalDate",
            Tag::Composer => "Composer",
            Tag::Performer => "Performer",
            Tag::Conductor => "Conductor",
            Tag::Work => "Work",
            Tag::Grouping => "Grouping",
            Tag::Comment => "Comment",
            Tag::Disc => "Disc",
            Tag::Label => "Label",
            Tag::MusicBrainzArtistId => "MUSICBRAINZ_ARTISTID",
            Tag::MusicBrainzAlbumId => "MUSICBRAINZ_ALBUMID",
            Tag::MusicBrainzAlbumArtistId => "MUSICBRAINZ_ALBUMARTISTID",
            Tag::MusicBrainzTrackId => "MUSICBRAINZ_TRACKID",
            Tag::MusicBrainzReleaseTrackId => "MUSICBRAINZ_RELEASETRACKID",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Tag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("Unknown tag: {name}"))
    }
}

/// Ordered selection of tag types
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagTypes(BTreeSet<Tag>);

impl TagTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma separated list of tag names, ignoring unknown names
    pub fn parse_list(list: &str) -> Self {
        list.split(',')
            .filter(|name| !name.trim().is_empty())
            .filter_map(|name| name.parse().ok())
            .collect()
    }

    pub fn insert(&mut self, tag: Tag) -> bool {
        self.0.insert(tag)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.0.contains(&tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Tag> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Tag> for TagTypes {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A single catalog entry as received from the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub uri: String,
    pub tags: BTreeMap<Tag, Vec<String>>,
    pub duration: Option<f64>,
    pub last_modified: Option<String>,
}

impl Song {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Builder style helper, mostly used to assemble songs in tests
    pub fn with_tag(mut self, tag: Tag, value: impl Into<String>) -> Self {
        self.add_tag(tag, value);
        self
    }

    pub fn add_tag(&mut self, tag: Tag, value: impl Into<String>) {
        self.tags.entry(tag).or_default().push(value.into());
    }

    /// All values of `tag` joined with ", ", or [`TAG_PLACEHOLDER`] when unset.
    ///
    /// `AlbumArtist` falls back to `Artist` for songs that carry no album artist.
    pub fn tag_value(&self, tag: Tag) -> String {
        match self.tags.get(&tag) {
            Some(values) if !values.is_empty() => values.join(", "),
            _ if tag == Tag::AlbumArtist => self.tag_value(Tag::Artist),
            _ => TAG_PLACEHOLDER.to_string(),
        }
    }
}

/// True for values that must not be used as an album key component
pub fn is_unset(value: &str) -> bool {
    value.is_empty() || value == TAG_PLACEHOLDER
}
