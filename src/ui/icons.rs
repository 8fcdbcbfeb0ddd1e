//! Shared UI icons.
//!
//! Each icon falls back to a plain-text marker on terminals without emoji support.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");

// Per-directive outcomes
pub static FILE_MOD: Emoji<'_, '_> = Emoji("📝 ", "~");
pub static SKIP: Emoji<'_, '_> = Emoji("➖ ", "=");
pub static MISSING: Emoji<'_, '_> = Emoji("❓ ", "?");
pub static BLOCKED: Emoji<'_, '_> = Emoji("🚧 ", "!");

// Remote job
pub static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[Q]");
pub static CLOCK: Emoji<'_, '_> = Emoji("⏱️  ", "[T]");
