//! Pure simulation logic for Kennel.
//!
//! This crate contains the parts of the game that are independent of any
//! entity storage, persistence, or runtime. Functions take plain data and
//! return results, so they can be unit-tested in isolation and reused by
//! the engine and the headless harness alike.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`collision`] | Swept-segment gather detection, ordered gather events |
//! | [`geometry`] | Grid points, roads and their occupancy rectangles, offices |
//! | [`loot_gen`] | Loot spawn count per tick from period and probability |
//! | [`movement`] | Directions, velocity model, road-clamped movement resolver |

pub mod collision;
pub mod geometry;
pub mod loot_gen;
pub mod movement;
