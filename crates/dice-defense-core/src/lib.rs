//! Core types and definitions for the dice-defense simulation.
//!
//! This crate defines the vocabulary shared by the simulation and the
//! runner: geometric types, commands, state snapshots, events and
//! tuning constants. It has no dependency on any runtime framework.

pub mod commands;
pub mod constants;
pub mod enums;
pub mod events;
pub mod state;
pub mod types;
