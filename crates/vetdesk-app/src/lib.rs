// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod filter;
pub mod focus;
pub mod focus_env;
pub mod forms;
pub mod ids;
pub mod model;
pub mod roster;
pub mod roving;
pub mod shortcuts;
pub mod sort;
pub mod state;
pub mod table;

pub use filter::*;
pub use focus::*;
pub use focus_env::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use roster::*;
pub use roving::*;
pub use shortcuts::*;
pub use sort::*;
pub use state::*;
pub use table::*;
