// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurograph
//!
//! Networks of spiking and graded nodes linked by weighted cables, declared
//! once, compiled into a fixed execution plan, then stepped in discrete time.
//!
//! ## Crates
//! - [`neural`]: node models (Graded, LIF, quadratic LIF, ELIF, AdEx,
//!   Izhikevich), compartments and cable transforms
//! - [`plasticity`]: exponential, power-law, event-based and modulated STDP,
//!   plus a Hebbian rule for graded signals
//! - [`engine`]: graph builder and compiler, clamp table, simulator,
//!   topology export and snapshots
//! - [`config`]: `neurograph.toml` loading with env and CLI overrides
//! - [`observability`]: logging setup and per-crate debug flags
//!
//! ## Example
//!
//! ```rust
//! use neurograph::prelude::*;
//!
//! let mut builder = GraphBuilder::new();
//! let a = builder
//!     .add_node("a", NodeModel::Graded(GradedParameters::default()), 1)
//!     .unwrap();
//! let b = builder
//!     .add_node(
//!         "b",
//!         NodeModel::Lif(LifParameters::default().with_tau_m(2.0).with_refractory(2.0)),
//!         1,
//!     )
//!     .unwrap();
//! builder
//!     .add_cable(CableSpec::new("a_b", a, "z", b, "j").with_weights(WeightInit::constant(1.5)))
//!     .unwrap();
//! builder.add_clamp_site(a, "z").unwrap();
//!
//! let mut sim = Simulator::new(builder.compile(CompileOptions::default()).unwrap());
//! sim.set_clamp(a, "z", 1.0_f32).unwrap();
//! let report = sim.run(6, 1.0).unwrap();
//! assert_eq!(report.spike_train(b), vec![0, 0, 1, 0, 0, 1]);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use neurograph_config as config;
pub use neurograph_npu_engine as engine;
pub use neurograph_npu_neural as neural;
pub use neurograph_npu_plasticity as plasticity;
pub use neurograph_observability as observability;

pub mod scenario;

pub mod prelude {
    //! Types needed to declare, compile and run a graph

    pub use neurograph_npu_engine::{
        CableSpec, ClampValue, CompileOptions, Coupling, ExecOrder, GraphBuilder, ModelSnapshot,
        ResetOptions, RunReport, SimError, SimResult, Simulator, StepReport, StepSettings,
        StepWarning, TopologyExport,
    };
    pub use neurograph_npu_neural::{
        Activation, AdExParameters, CableId, DenseTransform, ElifParameters, GradedParameters,
        IzhikevichParameters, LifParameters, NodeId, NodeModel, PatchLayout,
        QuadraticLifParameters, WeightInit,
    };
    pub use neurograph_npu_plasticity::{PlasticityRule, RuleKind, TraceMode, WeightPrior};
}
