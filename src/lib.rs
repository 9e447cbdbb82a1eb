#![cfg_attr(not(test), no_std)]

//! Bicycle trip computer: wheel-speed capture, frame inclination, touch
//! navigation and a persisted lifetime record, for an STM32F405 board.
//!
//! Everything here is hardware-agnostic: drivers are written against
//! `embedded-hal` 1.0 and interrupt-shared state lives behind
//! critical-section mutexes, so the whole pipeline also runs on the host.

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

pub mod config;
pub mod controller;
pub mod drivers;
pub mod edge_capture;
pub mod error;
pub mod irq;
pub mod orientation;
pub mod record;
pub mod state;
pub mod time_base;
pub mod touch;
pub mod view;
