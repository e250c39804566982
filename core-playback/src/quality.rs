//! Stream quality preference and descriptor selection

use core_extension::Streamable;
use std::fmt;
use std::str::FromStr;

/// User preference for which stream variant to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamQuality {
    Highest,
    Medium,
    Lowest,
    /// Unrecognised preference; the first listed stream is used.
    Other(String),
}

impl StreamQuality {
    pub fn as_str(&self) -> &str {
        match self {
            StreamQuality::Highest => "highest",
            StreamQuality::Medium => "medium",
            StreamQuality::Lowest => "lowest",
            StreamQuality::Other(value) => value,
        }
    }
}

impl FromStr for StreamQuality {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "highest" => StreamQuality::Highest,
            "medium" => StreamQuality::Medium,
            "lowest" => StreamQuality::Lowest,
            other => StreamQuality::Other(other.to_string()),
        })
    }
}

impl From<&str> for StreamQuality {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(quality) => quality,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for StreamQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick one descriptor from `streamables` according to `quality`.
///
/// `Medium` takes the element at index `len / 2` of the list sorted by
/// quality. Ties keep their listed order. Returns `None` for an empty list.
pub fn select_stream<'a>(
    streamables: &'a [Streamable],
    quality: &StreamQuality,
) -> Option<&'a Streamable> {
    match quality {
        // `max_by_key` keeps the last maximum; reverse so the first one wins.
        StreamQuality::Highest => streamables.iter().rev().max_by_key(|s| s.quality),
        StreamQuality::Lowest => streamables.iter().min_by_key(|s| s.quality),
        StreamQuality::Medium => {
            let mut sorted: Vec<&Streamable> = streamables.iter().collect();
            sorted.sort_by_key(|s| s.quality);
            sorted.get(streamables.len() / 2).copied()
        }
        StreamQuality::Other(_) => streamables.first(),
    }
}
