//! Port based direction dispatch.
//!
//! There is no connection tracking: a segment is a request when it is sent to
//! the protocol port, and a response when it is sent from it.
use std::fmt;

/// Well-known TCP port of the protocol.
pub const PORT: u16 = 102;

/// Which way a message travels.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    /// Classify a segment by its ports. The destination port wins when both
    /// ports are [`PORT`]. Returns `None` for unrelated connections.
    #[inline]
    #[must_use]
    pub fn classify(source: u16, dest: u16) -> Option<Direction> {
        if dest == PORT {
            Some(Direction::Request)
        } else if source == PORT {
            Some(Direction::Response)
        } else {
            None
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Request => f.write_str("REQUEST"),
            Direction::Response => f.write_str("RESPONSE"),
        }
    }
}
