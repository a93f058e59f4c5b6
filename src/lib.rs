// ==============================================================================
// lib.rs - SOLAR Tabulation Library
// ==============================================================================
// Description: Library interface for parsing SOLAR polygenic.out reports and
//              tabulating them into one wide table
// Author: Matt Barham
// Created: 2025-11-03
// Modified: 2026-10-17
// Version: 2.0.0
// ==============================================================================

pub mod parsers;
pub mod models;
pub mod column_key;
pub mod table;
pub mod locator;
pub mod processor;
pub mod output;
