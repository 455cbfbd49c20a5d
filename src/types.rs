/// Identifier for the source that produced a record.
/// Examples: `lichess_2024_01.pgn`, `stdin`, `tcec/season_21.pgn`
pub type SourceId = String;
/// Identifier for one shard of a source.
/// Examples: `lichess_2024_01.pgn`, `lichess_2024_01.pgn@0..1048576`
pub type ShardId = String;
/// PGN tag name as it appears in a tag-pair line.
/// Examples: `Event`, `Result`, `WhiteElo`
pub type TagName = String;
/// Unescaped PGN tag value.
/// Examples: `1-0`, `Hastings 1895`, `2024.01.31`
pub type TagValue = String;
/// File extension used when discovering sources under a directory.
/// Examples: `pgn`, `txt`
pub type FileExtension = String;
