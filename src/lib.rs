// Library root
// -----------
// This crate exposes the pieces of the umbrella reservation client. The
// binary (`main.rs`) wires them together into the interactive CLI.
//
// Module responsibilities:
// - `domain`: Validated value types (seats, umbrella and reservation ids,
//   credentials, prices, reservation periods).
// - `menu`: The text menu engine (keys, entries, builder, run loop).
// - `console`: Line input/output used by menus and flows, with a real
//   terminal implementation and a scripted one for tests.
// - `api`: Encapsulates HTTP interactions with the reservation service.
// - `ui`: The application controller connecting menus to the API.
// - `error`: Validation and menu-builder errors.
pub mod api;
pub mod console;
pub mod domain;
pub mod error;
pub mod menu;
pub mod ui;
