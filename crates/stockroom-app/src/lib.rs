// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod api;
pub mod bulk;
pub mod cache;
pub mod edit;
pub mod ids;
pub mod model;
pub mod selection;
pub mod state;

pub use api::*;
pub use bulk::*;
pub use cache::*;
pub use edit::*;
pub use ids::*;
pub use model::*;
pub use selection::*;
pub use state::*;
