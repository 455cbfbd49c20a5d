/// Constants describing the PGN result marker and its closed vocabulary.
pub mod pgn {
    /// Tag name carrying the game result.
    pub const RESULT_TAG: &str = "Result";
    /// Result value for a white (first party) win.
    pub const RESULT_WHITE_WINS: &[u8] = b"1-0";
    /// Result value for a black (second party) win.
    pub const RESULT_BLACK_WINS: &[u8] = b"0-1";
    /// Result value for a drawn game.
    pub const RESULT_DRAW: &[u8] = b"1/2-1/2";
    /// Result value for an undetermined or ongoing game.
    pub const RESULT_UNDETERMINED: &[u8] = b"*";
    /// Opening byte of a tag-pair line.
    pub const TAG_OPEN: u8 = b'[';
    /// Closing byte of a tag-pair line.
    pub const TAG_CLOSE: u8 = b']';
}

/// Constants used by coordinator defaults.
pub mod coordinator {
    /// Worker count used when available parallelism cannot be queried.
    pub const FALLBACK_WORKERS: usize = 4;
    /// Default number of byte-range shards a single file may be split into.
    pub const DEFAULT_SHARDS_PER_SOURCE: usize = 1;
    /// Files smaller than this are never split into byte ranges.
    pub const DEFAULT_MIN_SHARD_BYTES: u64 = 4 * 1024 * 1024;
}

/// Constants used by source discovery and naming.
pub mod sources {
    /// Extension matched when walking directories for sources.
    pub const DEFAULT_EXTENSION: &str = "pgn";
    /// Source id used for standard input.
    pub const STDIN_SOURCE_ID: &str = "stdin";
    /// Path argument that selects standard input.
    pub const STDIN_PATH: &str = "-";
}

/// Constants used by report rendering.
pub mod report {
    /// Row label used for the merged tally in per-source tables.
    pub const ALL_SOURCES_LABEL: &str = "ALL";
    /// CSV header for tally rows.
    pub const CSV_HEADER: &str =
        "source,total,white_wins,black_wins,draws,unknown,white_pct,black_pct,draw_pct";
}
