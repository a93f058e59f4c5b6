// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Parsers for SOLAR result file formats
// Author: Matt Barham
// Created: 2025-11-03
// Modified: 2026-10-12
// Version: 2.0.0
// ==============================================================================

pub mod polygenic;

pub use polygenic::{PolygenicParseError, PolygenicParser, INCOMPLETE_RUN_MARKER};
