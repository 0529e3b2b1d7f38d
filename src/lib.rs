// Copyright 2026 LPSE Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! LPSE tender scraper library.
//!
//! Drives a headless Chromium instance through the SPSE e-procurement
//! portal's browser-verification challenge, extracts the session-bound
//! authenticity token from the rendered listing page, issues the data
//! request from inside the page context, and exposes the results over a
//! small HTTP API.

pub mod cli;
pub mod config;
pub mod error;
pub mod renderer;
pub mod rest;
pub mod scraper;
