use std::fmt;

/// A live channel of the broadcaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    /// Name used on the command line, e.g. `24`.
    pub slug: &'static str,
    /// Identifier expected by the playlist API.
    pub id: u32,
    pub name: &'static str,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.slug)
    }
}

const CHANNELS: &[Channel] = &[
    Channel {
        slug: "1",
        id: 1,
        name: "ČT1",
    },
    Channel {
        slug: "2",
        id: 2,
        name: "ČT2",
    },
    Channel {
        slug: "24",
        id: 24,
        name: "ČT24",
    },
    Channel {
        slug: "sport",
        id: 4,
        name: "ČT sport",
    },
    Channel {
        slug: "D",
        id: 5,
        name: "ČT :D",
    },
    Channel {
        slug: "art",
        id: 6,
        name: "ČT art",
    },
];

/// Fixed table of live channels, in display order.
#[derive(Debug, Clone, Copy)]
pub struct ChannelDirectory {
    channels: &'static [Channel],
}

impl Default for ChannelDirectory {
    fn default() -> Self {
        Self { channels: CHANNELS }
    }
}

impl ChannelDirectory {
    /// Looks a channel up by slug, ignoring ASCII case.
    pub fn get(&self, slug: &str) -> Option<&'static Channel> {
        let slug = slug.trim();
        self.channels
            .iter()
            .find(|c| c.slug.eq_ignore_ascii_case(slug))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static Channel> + use<> {
        self.channels.iter()
    }

    pub fn slugs(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.slug).collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
