//! fieldgate - Embedded telemetry gateway for remote field sensing
//!
//! This library implements the control plane of a battery-powered gateway that
//! aggregates readings from two vision peripherals (behind an I2C bus
//! multiplexer) and a serial environmental sensor board, then relays them to a
//! remote collector over a duty-cycle-constrained long-range radio link with a
//! local network fallback path. Remote commands arriving on the radio downlink
//! reconfigure transmission cadence, radio parameters, and alarm behavior.
//!
//! Everything runs on a single cooperative, tick-driven control loop; there is
//! no preemptive multitasking and every peripheral or transport operation is
//! bounded by an explicit timeout.

#![cfg_attr(not(test), no_std)]

// The host-side mocks are backed by std collections
#[cfg(any(test, feature = "mock"))]
extern crate std;

// Platform abstraction layer (traits, errors, host mocks)
pub mod platform;

// Core systems (logging)
pub mod core;

// Device drivers using platform abstraction
pub mod devices;

// Telemetry aggregation and wire codec
pub mod telemetry;

// Dual-path transport management (radio + network fallback)
pub mod transport;

// Downlink command processing
pub mod command;

// Persisted gateway configuration
pub mod config;

// Top-level gateway scheduler state machine
pub mod gateway;
