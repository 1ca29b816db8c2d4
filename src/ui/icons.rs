//! Shared UI icons and emojis.
//!
//! This module provides common emoji constants used across the UI
//! components for consistent visual styling.

use console::Emoji;

// Step status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static RUNNING: Emoji<'_, '_> = Emoji("▶️  ", "[>]");
pub static PENDING: Emoji<'_, '_> = Emoji("⏳ ", "[..]");

// Stage indicators
pub static ACTIVE: Emoji<'_, '_> = Emoji("🔵 ", "[*]");
pub static LOCKED: Emoji<'_, '_> = Emoji("🔒 ", "[X]");
pub static UPCOMING: Emoji<'_, '_> = Emoji("⚪ ", "[ ]");

// Misc
pub static CLOCK: Emoji<'_, '_> = Emoji("⏱️  ", "[T]");
pub static COST: Emoji<'_, '_> = Emoji("💲 ", "[$]");
