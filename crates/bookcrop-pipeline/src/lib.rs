// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Book Cropper Pipeline — folder lifecycle, the staged crop/rotate/rename/
// convert executors, the bounded per-stage dispatcher and output
// materialization.  Built on the domain types of `bookcrop-core` and the codec
// in `bookcrop-imaging`.

pub mod controller;
pub mod dispatch;
pub mod materialize;
pub mod report;
pub mod stages;
pub mod state;
pub mod workspace;

pub use controller::Pipeline;
pub use dispatch::Dispatcher;
pub use materialize::Materialization;
pub use report::{RunReport, StageReport};
pub use state::RunState;
pub use workspace::{AssumeYes, Confirm, StdinConfirm};
