/// Generic embed builders shared across commands.
pub mod embed;
/// Shared formatting helpers (numbers, progress bars, durations).
pub mod formatting;
/// Display-name matching for roles and channels.
pub mod names;
/// Single source of truth for the message-command prefix.
pub const COMMAND_PREFIX: char = '!';
/// Shared pagination helper utilities.
pub mod pagination;
/// Shared time helpers.
pub mod time;
